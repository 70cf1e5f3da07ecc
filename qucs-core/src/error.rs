use std::path::PathBuf;

use crate::config::ConfigError;
use crate::document::{DocumentError, DocumentId};
use crate::element::ElementId;
use crate::format::FormatError;
use crate::simulation::SimulationError;

/// Errors of document set level operations.
#[derive(Debug, thiserror::Error)]
pub enum QucsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("{} is open in another document", .0.display())]
    Conflict(PathBuf),
    #[error("No open document with id {0}")]
    UnknownDocument(DocumentId),
    #[error("No element with id {0}")]
    UnknownElement(ElementId),
    #[error("Element {0} is not a subcircuit")]
    NotSubcircuit(ElementId),
    #[error("No document to return to")]
    NoHierarchy,
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, QucsError>;
