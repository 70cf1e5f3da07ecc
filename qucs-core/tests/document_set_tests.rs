//! Integration tests for the set of open documents: opening, closing,
//! hierarchy navigation and subcircuit port propagation

use qucs_core::library::lookup;
use qucs_core::prelude::*;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy the schematic fixtures into `dir` so tests can save freely.
fn project(dir: &Path) {
    for name in ["amp.sch", "top.sch", "filter.sch", "amp.dat"] {
        std::fs::copy(fixture_path(name), dir.join(name)).unwrap();
    }
}

fn add_port(doc: &mut Document, num: usize) {
    let mut port = Component::from_model(
        lookup("Port").unwrap(),
        format!("P{}", num),
        Point::new(50, 100 * num as i32),
    );
    port.set_property("Num", &num.to_string());
    doc.place(port);
}

#[test]
fn test_open_twice_returns_same_document() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());

    let first = set.open(&dir.path().join("amp.sch")).unwrap();
    add_port(set.current_mut(), 3);
    set.open(&dir.path().join("top.sch")).unwrap();

    let again = set.open(&dir.path().join("amp.sch")).unwrap();
    assert_eq!(again, first);
    assert_eq!(set.current_id(), first);
    assert_eq!(set.len(), 2);
    // the unsaved edit is still there, so the file was not parsed again
    assert!(set.current().is_changed());
    assert_eq!(set.current().schematic().port_count(), 3);
}

#[test]
fn test_port_sync_updates_every_open_document() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());

    let top = set.open(&dir.path().join("top.sch")).unwrap();
    let filter = set.open(&dir.path().join("filter.sch")).unwrap();
    let amp = set.open(&dir.path().join("amp.sch")).unwrap();
    for id in [top, filter] {
        for sub in set.get(id).unwrap().schematic().components().iter().filter(|c| c.is_subcircuit()) {
            assert_eq!(sub.port_count(), 2);
        }
    }

    set.select(top).unwrap();
    add_port(set.get_mut(amp).unwrap(), 3);
    assert_eq!(set.save(amp).unwrap(), 3);

    assert_eq!(set.current_id(), top);
    let mut instances = 0;
    for id in [top, filter] {
        let doc = set.get(id).unwrap();
        assert!(!doc.is_changed());
        for sub in doc.schematic().components().iter().filter(|c| c.is_subcircuit()) {
            assert_eq!(sub.port_count(), 3);
            assert_eq!(doc.schematic().connections_at(sub.ports()[2]), &[sub.id]);
            instances += 1;
        }
    }
    assert_eq!(instances, 3);

    let filter_doc = set.get(filter).unwrap();
    let sub2 = filter_doc
        .schematic()
        .components()
        .iter()
        .find(|c| c.name == "SUB2")
        .unwrap();
    assert!(sub2.mirrored);
    assert_eq!(sub2.rotation, 1);
    assert_eq!(sub2.center, Point::new(500, 200));
}

#[test]
fn test_close_all_discard_then_cancel_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());
    let a = set.open(&dir.path().join("amp.sch")).unwrap();
    add_port(set.current_mut(), 3);
    let b = set.open(&dir.path().join("top.sch")).unwrap();
    set.current_mut().place(Wire::new(Point::new(0, 0), Point::new(0, 50)));

    let mut answers = vec![CloseChoice::Discard, CloseChoice::Cancel].into_iter();
    let mut asked = 0;
    let closed = set
        .close_all(&mut |_: &Document| {
            asked += 1;
            answers.next().unwrap_or(CloseChoice::Cancel)
        })
        .unwrap();

    assert!(!closed);
    assert_eq!(asked, 2);
    assert_eq!(set.len(), 2);
    assert!(set.contains(a) && set.contains(b));
    assert!(set.get(a).unwrap().is_changed());
}

#[test]
fn test_close_all_save_all_asks_once() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());
    set.open(&dir.path().join("amp.sch")).unwrap();
    add_port(set.current_mut(), 3);
    set.open(&dir.path().join("top.sch")).unwrap();
    set.current_mut().place(Wire::new(Point::new(0, 0), Point::new(0, 50)));

    let mut asked = 0;
    let closed = set
        .close_all(&mut |_: &Document| {
            asked += 1;
            CloseChoice::SaveAll
        })
        .unwrap();
    assert!(closed);
    assert_eq!(asked, 1);
    assert_eq!(set.len(), 1);
    assert!(set.current().is_untitled());
    assert_eq!(qucs_core::probe_port_count(&dir.path().join("amp.sch"), "0.0.19").unwrap(), 3);
}

#[test]
fn test_close_all_with_failed_save_closes_nothing() {
    let mut set = DocumentSet::new(Settings::default());
    set.current_mut().place(Wire::new(Point::new(0, 0), Point::new(0, 50)));
    assert!(set.close_all(&mut |_: &Document| CloseChoice::Save).is_err());
    assert_eq!(set.len(), 1);
    assert!(set.current().is_changed());
}

#[test]
fn test_descend_and_ascend() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());
    let top = set.open(&dir.path().join("top.sch")).unwrap();
    let sub = set.current().schematic().components()[0].id;

    let amp = set.descend(sub).unwrap();
    assert_eq!(set.current().name(), "amp.sch");
    assert!(set.can_ascend());

    assert_eq!(set.ascend().unwrap(), top);
    assert_eq!(set.current_id(), top);
    assert!(!set.can_ascend());
    assert!(set.contains(amp));
}

#[test]
fn test_tab_switch_forgets_hierarchy() {
    let dir = tempfile::tempdir().unwrap();
    project(dir.path());
    let mut set = DocumentSet::new(Settings::default());
    let top = set.open(&dir.path().join("top.sch")).unwrap();
    let sub = set.current().schematic().components()[0].id;
    set.descend(sub).unwrap();

    set.select(top).unwrap();
    assert!(!set.can_ascend());
}

#[test]
fn test_descend_into_missing_file_pops_entry() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixture_path("top.sch"), dir.path().join("top.sch")).unwrap();
    let mut set = DocumentSet::new(Settings::default());
    set.open(&dir.path().join("top.sch")).unwrap();
    let sub = set.current().schematic().components()[0].id;

    assert!(set.descend(sub).is_err());
    assert!(!set.can_ascend());
    assert_eq!(set.current().name(), "top.sch");
}
