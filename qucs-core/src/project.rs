//! Project directory contents and file management.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::document_set::DocumentSet;
use crate::error::{QucsError, Result};
use crate::format::probe_port_count;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Schematic,
    DataDisplay,
    Dataset,
    Other,
}

impl FileKind {
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("sch") => FileKind::Schematic,
            Some("dpl") => FileKind::DataDisplay,
            Some("dat") => FileKind::Dataset,
            _ => FileKind::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Subcircuit ports, for schematics only.
    pub port_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectContents {
    pub schematics: Vec<ProjectFile>,
    pub data_displays: Vec<ProjectFile>,
    pub datasets: Vec<ProjectFile>,
    pub others: Vec<ProjectFile>,
}

impl ProjectContents {
    pub fn len(&self) -> usize {
        self.schematics.len() + self.data_displays.len() + self.datasets.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// List the files of a project directory by kind. Schematics that fail the
/// header check are left out.
pub fn scan_project(dir: &Path, running: &str) -> std::io::Result<ProjectContents> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut contents = ProjectContents::default();
    for path in paths {
        let kind = FileKind::of(&path);
        let mut file = ProjectFile {
            path,
            kind,
            port_count: None,
        };
        match kind {
            FileKind::Schematic => match probe_port_count(&file.path, running) {
                Ok(ports) => {
                    file.port_count = Some(ports);
                    contents.schematics.push(file);
                }
                Err(e) => tracing::warn!("Skipping {:?}: {}", file.path, e),
            },
            FileKind::DataDisplay => contents.data_displays.push(file),
            FileKind::Dataset => contents.datasets.push(file),
            FileKind::Other => contents.others.push(file),
        }
    }
    Ok(contents)
}

impl DocumentSet {
    /// Delete a project file. Open documents cannot be deleted.
    pub fn delete_file(&mut self, path: &Path) -> Result<()> {
        if self.is_open(path) {
            return Err(QucsError::Conflict(path.to_path_buf()));
        }
        std::fs::remove_file(path)?;
        tracing::info!("Deleted {:?}", path);
        Ok(())
    }

    /// Delete the schematic, data display and dataset sharing `stem`. Nothing
    /// is deleted when any of them is open.
    pub fn delete_group(&mut self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        let group: Vec<PathBuf> = ["sch", "dpl", "dat"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .filter(|p| p.exists())
            .collect();
        if let Some(open) = group.iter().find(|p| self.is_open(p)) {
            return Err(QucsError::Conflict(open.clone()));
        }
        for path in &group {
            std::fs::remove_file(path)?;
        }
        tracing::info!("Deleted {} files of group {}", group.len(), stem);
        Ok(group)
    }

    /// Rename a project file. Open documents cannot be renamed and existing
    /// files are not overwritten.
    pub fn rename_file(&mut self, from: &Path, to: &Path) -> Result<()> {
        if self.is_open(from) {
            return Err(QucsError::Conflict(from.to_path_buf()));
        }
        if to.exists() {
            return Err(QucsError::Conflict(to.to_path_buf()));
        }
        std::fs::rename(from, to)?;
        tracing::info!("Renamed {:?} to {:?}", from, to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    const DOC: &str = "<Qucs Schematic 0.0.19>\n<Components>\n  <Port P1 1 0 0 -23 12 0 0 \"1\" 1>\n</Components>\n";

    #[test]
    fn test_scan_groups_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("amp.sch"), DOC).unwrap();
        std::fs::write(dir.path().join("broken.sch"), "not a schematic").unwrap();
        std::fs::write(dir.path().join("amp.dat"), "<Qucs Dataset 0.0.19>\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let contents = scan_project(dir.path(), "0.0.19").unwrap();
        assert_eq!(contents.schematics.len(), 1);
        assert_eq!(contents.schematics[0].port_count, Some(1));
        assert_eq!(contents.datasets.len(), 1);
        assert_eq!(contents.others.len(), 1);
        assert_eq!(contents.len(), 3);
    }

    #[test]
    fn test_open_files_are_protected() {
        let dir = tempfile::tempdir().unwrap();
        let sch = dir.path().join("amp.sch");
        std::fs::write(&sch, DOC).unwrap();
        std::fs::write(dir.path().join("amp.dpl"), DOC).unwrap();

        let mut set = DocumentSet::new(Settings::default());
        set.open(&sch).unwrap();
        assert!(matches!(set.delete_file(&sch), Err(QucsError::Conflict(_))));
        assert!(matches!(set.delete_group(dir.path(), "amp"), Err(QucsError::Conflict(_))));
        assert!(matches!(
            set.rename_file(&sch, &dir.path().join("b.sch")),
            Err(QucsError::Conflict(_))
        ));
        assert!(sch.exists());

        set.close_current(crate::document_set::CloseChoice::Discard).unwrap();
        let removed = set.delete_group(dir.path(), "amp").unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!sch.exists());
    }
}
