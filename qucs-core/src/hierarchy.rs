//! Descending into subcircuits and climbing back out.
//!
//! Each descent remembers the document it started from. An entry is
//! `pending` while a navigation step is switching documents; plain tab
//! switches in that window must not discard the history.

use std::path::PathBuf;

use crate::document::DocumentId;
use crate::document_set::DocumentSet;
use crate::element::ElementId;
use crate::error::{QucsError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub origin: DocumentId,
    /// Used to reopen the origin when it was closed in the meantime.
    pub origin_path: Option<PathBuf>,
    pub pending: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyHistory {
    entries: Vec<HierarchyEntry>,
}

impl HierarchyHistory {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&HierarchyEntry> {
        self.entries.last()
    }

    pub fn push_pending(&mut self, origin: DocumentId, origin_path: Option<PathBuf>) {
        self.entries.push(HierarchyEntry {
            origin,
            origin_path,
            pending: true,
        });
    }

    pub fn complete_top(&mut self) {
        if let Some(top) = self.entries.last_mut() {
            top.pending = false;
        }
    }

    pub fn mark_top_pending(&mut self) {
        if let Some(top) = self.entries.last_mut() {
            top.pending = true;
        }
    }

    pub fn pop(&mut self) -> Option<HierarchyEntry> {
        self.entries.pop()
    }

    /// A user switched tabs: forget the history unless a navigation step is
    /// in flight.
    pub fn on_tab_switch(&mut self) {
        if !self.top().map(|e| e.pending).unwrap_or(false) {
            self.entries.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn can_ascend(&self) -> bool {
        !self.entries.is_empty()
    }
}

impl DocumentSet {
    /// Open the schematic behind a subcircuit instance of the current
    /// document and remember where we came from.
    pub fn descend(&mut self, component: ElementId) -> Result<DocumentId> {
        let doc = self.current();
        let comp = doc
            .schematic()
            .component(component)
            .ok_or(QucsError::UnknownElement(component))?;
        let file = comp
            .file_reference()
            .filter(|f| !f.is_empty())
            .ok_or(QucsError::NotSubcircuit(component))?;
        let target = doc.directory().join(file);
        let origin = doc.id();
        let origin_path = doc.path().map(|p| p.to_path_buf());

        self.hierarchy.push_pending(origin, origin_path);
        match self.open(&target) {
            Ok(id) => {
                self.hierarchy.complete_top();
                tracing::info!("Descended into {:?}", target);
                Ok(id)
            }
            Err(e) => {
                self.hierarchy.pop();
                Err(e)
            }
        }
    }

    /// Return to the document the last descent started from.
    pub fn ascend(&mut self) -> Result<DocumentId> {
        let entry = self.hierarchy.top().cloned().ok_or(QucsError::NoHierarchy)?;
        self.hierarchy.mark_top_pending();
        let result = if self.contains(entry.origin) {
            self.select(entry.origin).map(|_| entry.origin)
        } else if let Some(path) = &entry.origin_path {
            self.open(path)
        } else {
            Err(QucsError::UnknownDocument(entry.origin))
        };
        self.hierarchy.pop();
        if result.is_ok() {
            tracing::info!("Ascended to {}", self.current().name());
        }
        result
    }

    pub fn can_ascend(&self) -> bool {
        self.hierarchy.can_ascend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn id() -> DocumentId {
        DocumentSet::new(Settings::default()).current_id()
    }

    #[test]
    fn test_tab_switch_keeps_pending_entry() {
        let mut history = HierarchyHistory::default();
        history.push_pending(id(), None);
        history.on_tab_switch();
        assert!(history.can_ascend());

        history.complete_top();
        history.on_tab_switch();
        assert!(!history.can_ascend());
    }

    #[test]
    fn test_ascend_without_history() {
        let mut set = DocumentSet::new(Settings::default());
        assert!(matches!(set.ascend(), Err(QucsError::NoHierarchy)));
    }

    #[test]
    fn test_descend_into_plain_component_fails() {
        use crate::element::Component;
        use crate::geometry::Point;
        use crate::library::lookup;

        let mut set = DocumentSet::new(Settings::default());
        let r = set
            .current_mut()
            .place(Component::from_model(lookup("R").unwrap(), "R1", Point::new(0, 0)));
        assert!(matches!(set.descend(r), Err(QucsError::NotSubcircuit(_))));
        assert!(!set.can_ascend());
    }
}
