//! The open documents of one session, in tab order, with a current cursor.
//!
//! There is always at least one document: closing the last one leaves a
//! fresh untitled document behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::document::{Document, DocumentError, DocumentId};
use crate::error::{QucsError, Result};
use crate::hierarchy::HierarchyHistory;

/// Answer to "save changes?" when closing a dirty document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseChoice {
    Save,
    /// Save this and every following dirty document without asking.
    SaveAll,
    Discard,
    /// Discard this and every following dirty document without asking.
    DiscardAll,
    Cancel,
}

/// Asked once per dirty document by [`DocumentSet::close_all`].
pub trait CloseResolver {
    fn resolve(&mut self, doc: &Document) -> CloseChoice;
}

impl<F> CloseResolver for F
where
    F: FnMut(&Document) -> CloseChoice,
{
    fn resolve(&mut self, doc: &Document) -> CloseChoice {
        self(doc)
    }
}

#[derive(Debug)]
pub struct DocumentSet {
    pub(crate) settings: Arc<Settings>,
    pub(crate) docs: Vec<Document>,
    pub(crate) current: usize,
    pub(crate) hierarchy: HierarchyHistory,
}

impl DocumentSet {
    pub fn new(settings: Settings) -> Self {
        let settings = Arc::new(settings);
        Self {
            docs: vec![Document::untitled(settings.clone())],
            settings,
            current: 0,
            hierarchy: HierarchyHistory::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Never true; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    pub fn current(&self) -> &Document {
        &self.docs[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Document {
        &mut self.docs[self.current]
    }

    pub fn current_id(&self) -> DocumentId {
        self.current().id()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub(crate) fn index_of(&self, id: DocumentId) -> Result<usize> {
        self.docs
            .iter()
            .position(|d| d.id() == id)
            .ok_or(QucsError::UnknownDocument(id))
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.docs.iter().any(|d| d.id() == id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.docs.iter().find(|d| d.id() == id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.docs.iter_mut().find(|d| d.id() == id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        let path = normalize_path(path);
        self.docs
            .iter()
            .find(|d| d.path() == Some(path.as_path()))
            .map(|d| d.id())
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.find_by_path(path).is_some()
    }

    pub fn new_untitled(&mut self) -> DocumentId {
        let doc = Document::untitled(self.settings.clone());
        let id = doc.id();
        self.docs.push(doc);
        self.current = self.docs.len() - 1;
        self.hierarchy.on_tab_switch();
        id
    }

    /// Open `path`, or switch to it when it is already open. A document that
    /// fails to load is dropped and the cursor stays where it was.
    pub fn open(&mut self, path: &Path) -> Result<DocumentId> {
        let path = normalize_path(path);
        if let Some(id) = self.find_by_path(&path) {
            self.current = self.index_of(id)?;
            self.hierarchy.on_tab_switch();
            return Ok(id);
        }

        let doc = Document::open(path.clone(), self.settings.clone())?;
        let id = doc.id();
        self.docs.push(doc);
        self.current = self.docs.len() - 1;
        tracing::info!("Opened {:?}", path);

        if self.docs.len() == 2 {
            let other = &self.docs[0];
            if other.is_untitled() && !other.is_changed() {
                tracing::debug!("Closing unused untitled document");
                self.docs.remove(0);
                self.current = 0;
            }
        }
        self.hierarchy.on_tab_switch();
        Ok(id)
    }

    /// Plain tab switch.
    pub fn select(&mut self, id: DocumentId) -> Result<()> {
        self.current = self.index_of(id)?;
        self.hierarchy.on_tab_switch();
        Ok(())
    }

    pub fn next_tab(&mut self) -> DocumentId {
        self.current = (self.current + 1) % self.docs.len();
        self.hierarchy.on_tab_switch();
        self.current_id()
    }

    pub fn close_current(&mut self, choice: CloseChoice) -> Result<bool> {
        self.close(self.current_id(), choice)
    }

    /// Close one document. `choice` only matters when it has unsaved
    /// changes. Returns false when the close was cancelled.
    pub fn close(&mut self, id: DocumentId, choice: CloseChoice) -> Result<bool> {
        let index = self.index_of(id)?;
        if self.docs[index].is_changed() {
            match choice {
                CloseChoice::Cancel => return Ok(false),
                CloseChoice::Save | CloseChoice::SaveAll => {
                    self.save(id)?;
                }
                CloseChoice::Discard | CloseChoice::DiscardAll => {}
            }
        }

        let doc = self.docs.remove(index);
        tracing::debug!("Closed {}", doc.name());
        if self.docs.is_empty() {
            self.docs.push(Document::untitled(self.settings.clone()));
        }
        if self.current > index || self.current >= self.docs.len() {
            self.current = self.current.saturating_sub(1);
        }
        self.hierarchy.clear();
        Ok(true)
    }

    /// Close every document. All decisions are collected before anything is
    /// saved or closed; a cancel or a failed save leaves the set untouched.
    pub fn close_all(&mut self, resolver: &mut impl CloseResolver) -> Result<bool> {
        let mut to_save = Vec::new();
        let mut blanket: Option<CloseChoice> = None;
        for doc in self.docs.iter().filter(|d| d.is_changed()) {
            let choice = match blanket {
                Some(choice) => choice,
                None => resolver.resolve(doc),
            };
            match choice {
                CloseChoice::Cancel => return Ok(false),
                CloseChoice::Save => to_save.push(doc.id()),
                CloseChoice::SaveAll => {
                    blanket = Some(CloseChoice::Save);
                    to_save.push(doc.id());
                }
                CloseChoice::Discard => {}
                CloseChoice::DiscardAll => blanket = Some(CloseChoice::Discard),
            }
        }

        for id in to_save {
            self.save(id)?;
        }

        self.docs.clear();
        self.docs.push(Document::untitled(self.settings.clone()));
        self.current = 0;
        self.hierarchy.clear();
        tracing::info!("Closed all documents");
        Ok(true)
    }

    /// Save a document and bring subcircuit instances of it up to date in
    /// every open document.
    pub fn save(&mut self, id: DocumentId) -> Result<usize> {
        let index = self.index_of(id)?;
        let doc = &mut self.docs[index];
        let ports = doc.save()?;
        let path = doc.path().map(Path::to_path_buf);
        if let Some(path) = path {
            if ports > 0 {
                self.sync_ports(&path, ports);
            }
        }
        Ok(ports)
    }

    /// Save under a new name. Refused when another open document already
    /// uses that file.
    pub fn save_as(&mut self, id: DocumentId, path: &Path) -> Result<usize> {
        let path = normalize_path(path);
        let index = self.index_of(id)?;
        if let Some(other) = self.find_by_path(&path) {
            if other != id {
                return Err(QucsError::Conflict(path));
            }
        }
        self.docs[index].set_path(path);
        self.save(id)
    }

    /// Save every dirty document that has a file name. Returns how many were
    /// written.
    pub fn save_all(&mut self) -> Result<usize> {
        let ids: Vec<DocumentId> = self
            .docs
            .iter()
            .filter(|d| d.is_changed())
            .filter(|d| {
                if d.is_untitled() {
                    tracing::warn!("Skipping untitled document in save all");
                }
                !d.is_untitled()
            })
            .map(|d| d.id())
            .collect();
        for id in &ids {
            self.save(*id)?;
        }
        Ok(ids.len())
    }

    /// Switch to the data display paired with a document, creating an empty
    /// one in memory when the file does not exist yet.
    pub fn open_data_display(&mut self, id: DocumentId) -> Result<DocumentId> {
        let doc = self.get(id).ok_or(QucsError::UnknownDocument(id))?;
        let path = doc.data_display_path().ok_or(DocumentError::Untitled)?;
        if path.exists() {
            return self.open(&path);
        }
        let path = normalize_path(&path);
        if let Some(existing) = self.find_by_path(&path) {
            self.select(existing)?;
            return Ok(existing);
        }
        let display = Document::with_path(path, self.settings.clone());
        let display_id = display.id();
        self.docs.push(display);
        self.current = self.docs.len() - 1;
        self.hierarchy.on_tab_switch();
        Ok(display_id)
    }
}

/// Absolute form of a path used to compare documents. Missing files are
/// resolved through their parent directory.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|p| p.join(name))
            .unwrap_or_else(|_| absolute.clone()),
        _ => absolute,
    }
}
