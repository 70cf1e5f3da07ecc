//! Integration tests for loading, saving and editing single documents

use qucs_core::document::DocumentError;
use qucs_core::format::FormatError;
use qucs_core::library::lookup;
use qucs_core::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn copy_fixture(dir: &Path, name: &str) -> PathBuf {
    let target = dir.join(name);
    std::fs::copy(fixture_path(name), &target).unwrap();
    target
}

fn settings() -> Arc<Settings> {
    Arc::new(Settings::default())
}

fn load_error(name: &str) -> DocumentError {
    Document::open(fixture_path(name), settings()).unwrap_err()
}

#[test]
fn test_load_fixture() {
    let doc = Document::open(fixture_path("amp.sch"), settings()).unwrap();
    assert!(!doc.is_changed());
    assert_eq!(doc.schematic().components().len(), 3);
    assert_eq!(doc.schematic().port_count(), 2);
    assert_eq!(doc.schematic().wires().len(), 2);
    assert_eq!(doc.symbol().paintings().len(), 7);
    assert_eq!(doc.undo_state(), UndoState::default());
    assert_eq!(doc.viewport().view, Rect::new(0, 0, 800, 600));
    assert!(!doc.viewport().used.is_empty());
}

#[test]
fn test_newer_version_is_refused() {
    assert!(matches!(
        load_error("future.sch"),
        DocumentError::Format(FormatError::VersionTooNew { .. })
    ));
}

#[test]
fn test_older_version_loads() {
    let doc = Document::open(fixture_path("old.sch"), settings()).unwrap();
    assert_eq!(doc.version(), "0.0.1");
    assert_eq!(doc.schematic().components()[0].name, "R1");
}

#[test]
fn test_header_errors_are_distinct() {
    assert!(matches!(load_error("empty.sch"), DocumentError::Format(FormatError::EmptyFile)));
    assert!(matches!(load_error("notes.sch"), DocumentError::Format(FormatError::WrongMagic(_))));
    assert!(matches!(
        load_error("unclosed.sch"),
        DocumentError::Format(FormatError::UnclosedSection(_))
    ));
    assert!(matches!(load_error("missing.sch"), DocumentError::Io { .. }));
}

#[test]
fn test_subcircuit_ports_come_from_referenced_file() {
    let doc = Document::open(fixture_path("top.sch"), settings()).unwrap();
    let sub = &doc.schematic().components()[0];
    assert!(sub.is_subcircuit());
    assert_eq!(sub.file_reference(), Some("amp.sch"));
    assert_eq!(sub.port_count(), 2);
}

#[test]
fn test_unreadable_subcircuit_has_no_ports() {
    let dir = tempfile::tempdir().unwrap();
    let top = copy_fixture(dir.path(), "top.sch");
    let doc = Document::open(top, settings()).unwrap();
    assert_eq!(doc.schematic().components()[0].port_count(), 0);
}

#[test]
fn test_save_and_reload_keeps_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path(), "amp.sch");
    let mut doc = Document::open(&path, settings()).unwrap();

    let r1 = doc.schematic().components()[2].id;
    assert!(doc.set_property(r1, "R", "2 kOhm"));
    assert!(doc.is_changed());
    assert_eq!(doc.save().unwrap(), 2);
    assert!(!doc.is_changed());

    let reloaded = Document::open(&path, settings()).unwrap();
    assert_eq!(reloaded.schematic().components()[2].property("R"), Some("2 kOhm"));
    assert_eq!(reloaded.symbol().paintings().len(), 7);
    assert_eq!(reloaded.schematic().diagrams()[0].traces[0].variable, "S[2,1]");
    assert_eq!(reloaded.schematic().labels().len(), 2);
    assert_eq!(reloaded.properties().extra, vec!["Grid=10,10,1".to_string()]);
    assert!(reloaded.properties().open_display);
}

#[test]
fn test_undo_restores_dirty_flag_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path(), "amp.sch");
    let mut doc = Document::open(&path, settings()).unwrap();

    doc.place(Wire::new(Point::new(0, 0), Point::new(0, 100)));
    doc.save().unwrap();
    assert!(doc.undo().unwrap());
    assert!(doc.is_changed());
    assert!(doc.redo().unwrap());
    assert!(!doc.is_changed());
    assert!(!doc.redo().unwrap());
}

#[test]
fn test_move_selected_records_snapshot() {
    let mut doc = Document::open(fixture_path("amp.sch"), settings()).unwrap();
    let r1 = doc.schematic().components()[2].id;
    doc.graph_mut().set_selected(r1, true);
    assert_eq!(doc.move_selected(0, 50), 1);
    assert_eq!(doc.schematic().components()[2].center, Point::new(200, 200));
    assert!(doc.undo_state().can_undo);

    doc.undo().unwrap();
    let restored = doc.schematic().components().iter().find(|c| c.name == "R1").unwrap();
    assert_eq!(restored.center, Point::new(200, 150));
}

#[test]
fn test_delete_selected_area() {
    let mut doc = Document::open(fixture_path("amp.sch"), settings()).unwrap();
    let hits = doc.graph_mut().select_area(Rect::new(0, 100, 400, 200));
    assert!(hits >= 3);
    // selected wire labels go with their wire and are not counted twice
    let wire_labels = doc
        .schematic()
        .labels()
        .iter()
        .filter(|l| l.selected && l.wire.is_some())
        .count();
    let removed = doc.delete_selected();
    assert_eq!(removed, hits - wire_labels);
    assert!(doc.schematic().components().is_empty());
    assert!(doc.schematic().wires().is_empty());
}

#[test]
fn test_symbol_mode_adds_missing_pin() {
    let mut doc = Document::open(fixture_path("amp.sch"), settings()).unwrap();
    let mut port = Component::from_model(lookup("Port").unwrap(), "P3", Point::new(50, 300));
    port.set_property("Num", "3");
    doc.place(port);

    assert_eq!(doc.switch_paint_mode(), PaintMode::Symbol);
    let pins: Vec<usize> = doc
        .graph()
        .paintings()
        .iter()
        .filter_map(|p| p.port_number())
        .collect();
    assert_eq!(pins.len(), 3);
    assert!(pins.contains(&3));
    // the file already had a drawn symbol, so no default box is added
    assert_eq!(doc.graph().paintings().len(), 8);
}

fn symbol_pins(doc: &Document) -> usize {
    doc.graph().paintings().iter().filter(|p| p.port_number().is_some()).count()
}

#[test]
fn test_symbol_save_keeps_history_in_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = copy_fixture(dir.path(), "amp.sch");
    let mut doc = Document::open(&path, settings()).unwrap();
    assert_eq!(doc.switch_paint_mode(), PaintMode::Symbol);

    let pin2 = doc
        .graph()
        .paintings()
        .iter()
        .find(|p| p.port_number() == Some(2))
        .map(|p| p.id)
        .unwrap();
    doc.graph_mut().set_selected(pin2, true);
    assert_eq!(doc.delete_selected(), 1);
    assert_eq!(symbol_pins(&doc), 1);

    // saving puts the pin of port 2 back
    assert_eq!(doc.save().unwrap(), 2);
    assert_eq!(symbol_pins(&doc), 2);
    assert!(!doc.is_changed());

    assert!(doc.undo().unwrap());
    assert_eq!(symbol_pins(&doc), 1);
    assert!(doc.is_changed());
    assert!(doc.redo().unwrap());
    assert_eq!(symbol_pins(&doc), 2);
    assert!(!doc.is_changed());
}

#[test]
fn test_reload_results_fills_traces() {
    let mut doc = Document::open(fixture_path("amp.sch"), settings()).unwrap();
    assert_eq!(doc.reload_results().unwrap(), 1);
    let trace = &doc.schematic().diagrams()[0].traces[0];
    assert_eq!(trace.samples.len(), 2);
    assert_eq!(trace.samples[0].0, 1e9);
}

#[test]
fn test_reload_without_dataset_is_empty() {
    let mut doc = Document::open(fixture_path("top.sch"), settings()).unwrap();
    assert_eq!(doc.reload_results().unwrap(), 0);
}
