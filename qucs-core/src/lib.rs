//! qucs-core - document model and editing core of the Qucs schematic editor
//!
//! This library holds everything behind the editor window: the element graph
//! of a schematic, its file format, per-view undo/redo, the set of open
//! documents with subcircuit hierarchy navigation, and the propagation of
//! subcircuit port changes to every document that places them.
//!
//! # Quick Start
//!
//! ```no_run
//! use qucs_core::{DocumentSet, Settings};
//! use std::path::Path;
//!
//! let mut set = DocumentSet::new(Settings::default());
//! let id = set.open(Path::new("amp.sch")).unwrap();
//! let ports = set.save(id).unwrap();
//! println!("{} defines {} ports", set.current().name(), ports);
//! ```
//!
//! # Features
//!
//! - **Graph model**: components, wires, nodes, labels, diagrams, paintings
//! - **Undo/redo**: text snapshots, one stack per view mode
//! - **Hierarchy**: descend into subcircuits and back
//! - **Port sync**: rebuild placed subcircuits after their ports change
//! - **Simulation**: external simulator runs with cancellation

pub mod config;
pub mod document;
pub mod document_set;
pub mod element;
pub mod error;
pub mod format;
pub mod geometry;
pub mod graph;
pub mod hierarchy;
pub mod library;
pub mod port_sync;
pub mod project;
pub mod simulation;
pub mod undo;
pub mod viewport;

// Re-export main types
pub use config::{ConfigError, Settings, SimulatorSettings};
pub use document::{Document, DocumentError, DocumentId, PaintMode};
pub use document_set::{CloseChoice, CloseResolver, DocumentSet};
pub use element::{
    Component, Diagram, Element, ElementId, ElementKind, Label, Node, Painting, Property,
    PropertyKind, Wire,
};
pub use error::QucsError;
pub use format::{probe_port_count, FormatError};
pub use geometry::{Point, Rect};
pub use graph::{Graph, Net};
pub use hierarchy::{HierarchyEntry, HierarchyHistory};
pub use project::{scan_project, FileKind, ProjectContents, ProjectFile};
pub use simulation::{
    CancelHandle, FollowUp, FollowUpOutcome, SimulationError, SimulationReport, SimulationRun,
    Simulations,
};
pub use undo::{Snapshot, UndoStack, UndoState};
pub use viewport::Viewport;

/// Load a single document (convenience wrapper).
pub fn load_document(path: &std::path::Path, settings: Settings) -> Result<Document, DocumentError> {
    Document::open(path, std::sync::Arc::new(settings))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CloseChoice, Component, Document, DocumentId, DocumentSet, ElementId, Graph, PaintMode,
        Point, QucsError, Rect, Settings, UndoState, Wire,
    };
}
