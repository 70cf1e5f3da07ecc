//! Application settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Schematic format version written by this build; newer files are refused.
    pub version: String,
    /// Fallback directory for relative subcircuit references of untitled
    /// documents.
    pub work_dir: PathBuf,
    /// Snapshots kept per undo stack, 0 for unlimited.
    pub undo_capacity: usize,
    pub simulator: SimulatorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: "0.0.19".to_string(),
            work_dir: PathBuf::from("."),
            undo_capacity: 0,
            simulator: SimulatorSettings::default(),
        }
    }
}

/// External simulator command. `{input}` and `{output}` in the arguments are
/// replaced with the netlist and dataset paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            program: "qucsator".to_string(),
            args: vec![
                "-i".to_string(),
                "{input}".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
            ],
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
