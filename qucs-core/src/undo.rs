//! Snapshot based undo/redo.
//!
//! Every structural edit stores the full text of the edited graph. Undo and
//! redo just move a cursor over the stored snapshots, so restoring is always
//! a plain re-parse of known-good text.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub text: String,
    /// Dirty flag of the document at the time of the snapshot.
    pub changed: bool,
}

/// Availability of undo and redo for the active mode of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UndoState {
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    snapshots: Vec<Snapshot>,
    cursor: usize,
    /// Maximum number of snapshots kept; 0 keeps everything.
    capacity: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Drop the redo history, append the snapshot and make it current.
    pub fn push_snapshot(&mut self, text: String, changed: bool) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(Snapshot { text, changed });
        if self.capacity > 0 && self.snapshots.len() > self.capacity {
            let excess = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.cursor)
    }

    pub fn undo(&mut self) -> Option<&Snapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    pub fn state(&self) -> UndoState {
        UndoState {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    /// After a save the current snapshot matches the file and every other
    /// one differs from it.
    pub fn mark_clean(&mut self) {
        let cursor = self.cursor;
        for (i, snapshot) in self.snapshots.iter_mut().enumerate() {
            snapshot.changed = i != cursor;
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(i: usize) -> String {
        format!("<Components>\n  <R R{} 1 0 0 15 -26 0 0 \"1\" 1>\n</Components>\n", i)
    }

    #[test]
    fn test_empty_stack_has_nothing_to_do() {
        let mut stack = UndoStack::new();
        assert!(stack.undo().is_none());
        assert!(stack.redo().is_none());
        assert_eq!(stack.state(), UndoState::default());
    }

    #[test]
    fn test_first_snapshot_is_oldest_and_newest() {
        let mut stack = UndoStack::new();
        stack.push_snapshot(text(0), false);
        assert!(!stack.can_undo());
        assert!(!stack.can_redo());
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut stack = UndoStack::new();
        stack.push_snapshot(text(0), false);
        stack.push_snapshot(text(1), true);

        assert_eq!(stack.undo().map(|s| s.text.clone()), Some(text(0)));
        assert!(stack.undo().is_none());
        assert_eq!(stack.current().map(|s| s.text.clone()), Some(text(0)));

        assert_eq!(stack.redo().map(|s| s.text.clone()), Some(text(1)));
        assert!(stack.redo().is_none());
        assert_eq!(stack.state(), UndoState { can_undo: true, can_redo: false });
    }

    #[test]
    fn test_push_discards_redo_history() {
        let mut stack = UndoStack::new();
        for i in 0..3 {
            stack.push_snapshot(text(i), true);
        }
        stack.undo();
        stack.undo();
        stack.push_snapshot(text(9), true);
        assert_eq!(stack.len(), 2);
        assert!(!stack.can_redo());
        assert_eq!(stack.undo().map(|s| s.text.clone()), Some(text(0)));
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut stack = UndoStack::with_capacity(3);
        for i in 0..5 {
            stack.push_snapshot(text(i), true);
        }
        assert_eq!(stack.len(), 3);
        stack.undo();
        assert_eq!(stack.undo().map(|s| s.text.clone()), Some(text(2)));
        assert!(!stack.can_undo());
    }

    #[test]
    fn test_mark_clean_flags_other_snapshots() {
        let mut stack = UndoStack::new();
        stack.push_snapshot(text(0), false);
        stack.push_snapshot(text(1), true);
        stack.mark_clean();
        assert_eq!(stack.current().map(|s| s.changed), Some(false));
        assert_eq!(stack.undo().map(|s| s.changed), Some(true));
    }

    proptest! {
        #[test]
        fn prop_undo_then_redo_restores(pushes in 1usize..20, undos in 0usize..20) {
            let mut stack = UndoStack::new();
            for i in 0..pushes {
                stack.push_snapshot(text(i), i > 0);
            }
            for _ in 0..undos {
                stack.undo();
            }
            let before = stack.current().cloned();
            if stack.undo().is_some() {
                let restored = stack.redo().cloned();
                prop_assert_eq!(restored, before);
            } else {
                prop_assert!(!stack.can_undo());
                prop_assert_eq!(stack.current().cloned(), before);
            }
        }
    }
}
