//! One open schematic document.
//!
//! A document owns two graphs, the schematic and its subcircuit symbol, and
//! shows one of them at a time. Each view has its own viewport and its own
//! undo stack. Every editing operation that changes structure records a text
//! snapshot of the active graph, and undo/redo restore the graph by parsing
//! that text back.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::Settings;
use crate::element::{Element, ElementId, ElementKind};
use crate::format::{
    read_exchange, read_schematic, read_sections, write_exchange, write_graph_sections,
    write_schematic, Dataset, DocumentProperties, FormatError, SubcircuitResolver,
};
use crate::graph::Graph;
use crate::undo::{Snapshot, UndoStack, UndoState};
use crate::viewport::Viewport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which graph of a document is shown and edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaintMode {
    Schematic,
    Symbol,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
    #[error("Document has no file name")]
    Untitled,
}

#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    path: Option<PathBuf>,
    settings: Arc<Settings>,
    /// Format version of the loaded file.
    version: String,
    mode: PaintMode,
    schematic: Graph,
    symbol: Graph,
    schematic_view: Viewport,
    symbol_view: Viewport,
    schematic_undo: UndoStack,
    symbol_undo: UndoStack,
    changed: bool,
    properties: DocumentProperties,
}

impl Document {
    pub fn untitled(settings: Arc<Settings>) -> Self {
        let mut doc = Self {
            id: DocumentId::new(),
            path: None,
            version: settings.version.clone(),
            mode: PaintMode::Schematic,
            schematic: Graph::new(),
            symbol: Graph::new(),
            schematic_view: Viewport::schematic(),
            symbol_view: Viewport::symbol(),
            schematic_undo: UndoStack::with_capacity(settings.undo_capacity),
            symbol_undo: UndoStack::with_capacity(settings.undo_capacity),
            changed: false,
            properties: DocumentProperties::default(),
            settings,
        };
        doc.seed_schematic_undo();
        doc
    }

    /// An empty document bound to `path`; nothing is read yet.
    pub fn with_path(path: impl Into<PathBuf>, settings: Arc<Settings>) -> Self {
        let mut doc = Self::untitled(settings);
        doc.set_path(path.into());
        doc
    }

    /// Read a document from disk.
    pub fn open(path: impl Into<PathBuf>, settings: Arc<Settings>) -> Result<Self, DocumentError> {
        let mut doc = Self::with_path(path, settings);
        doc.load()?;
        Ok(doc)
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    /// File name for display, `untitled` without a path.
    pub fn name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    pub fn mode(&self) -> PaintMode {
        self.mode
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn properties(&self) -> &DocumentProperties {
        &self.properties
    }

    pub fn schematic(&self) -> &Graph {
        &self.schematic
    }

    pub fn symbol(&self) -> &Graph {
        &self.symbol
    }

    /// Graph of the current mode.
    pub fn graph(&self) -> &Graph {
        match self.mode {
            PaintMode::Schematic => &self.schematic,
            PaintMode::Symbol => &self.symbol,
        }
    }

    /// Direct access to the active graph. Structural changes made through it
    /// must be followed by [`Document::record_edit`].
    pub fn graph_mut(&mut self) -> &mut Graph {
        match self.mode {
            PaintMode::Schematic => &mut self.schematic,
            PaintMode::Symbol => &mut self.symbol,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        match self.mode {
            PaintMode::Schematic => &self.schematic_view,
            PaintMode::Symbol => &self.symbol_view,
        }
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        match self.mode {
            PaintMode::Schematic => &mut self.schematic_view,
            PaintMode::Symbol => &mut self.symbol_view,
        }
    }

    fn undo_stack_mut(&mut self) -> &mut UndoStack {
        match self.mode {
            PaintMode::Schematic => &mut self.schematic_undo,
            PaintMode::Symbol => &mut self.symbol_undo,
        }
    }

    pub fn undo_state(&self) -> UndoState {
        match self.mode {
            PaintMode::Schematic => self.schematic_undo.state(),
            PaintMode::Symbol => self.symbol_undo.state(),
        }
    }

    /// Directory relative references are resolved against: the document's
    /// own directory, or the configured work directory when untitled.
    pub fn directory(&self) -> PathBuf {
        self.path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.work_dir.clone())
    }

    fn resolver(&self) -> SubcircuitResolver {
        SubcircuitResolver::new(Some(self.directory()), self.settings.version.clone())
    }

    /// Bind the document to a new file. The paired data files follow the
    /// new file name.
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        if let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) {
            self.properties.data_set = Some(format!("{}.dat", stem));
            self.properties.data_display = Some(format!("{}.dpl", stem));
        }
        self.path = Some(path);
    }

    fn seed_schematic_undo(&mut self) {
        let text = write_graph_sections(&self.schematic, false);
        self.schematic_undo.clear();
        self.schematic_undo.push_snapshot(text, false);
    }

    fn refresh_extent(&mut self) {
        self.schematic_view.used = self.schematic.bounding_extent();
        self.symbol_view.used = self.symbol.bounding_extent();
    }

    /// Replace both graphs with the file contents. Dirty flag, mode and undo
    /// history are reset.
    pub fn load(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::Untitled)?;
        let content = std::fs::read_to_string(&path).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;
        let file = read_schematic(&content, &self.settings.version, &self.resolver())?;

        self.version = file.version;
        self.schematic = file.schematic;
        self.symbol = file.symbol;
        let defaults = std::mem::take(&mut self.properties);
        self.properties = file.properties;
        if self.properties.data_set.is_none() {
            self.properties.data_set = defaults.data_set;
        }
        if self.properties.data_display.is_none() {
            self.properties.data_display = defaults.data_display;
        }
        self.schematic_view = self.properties.view.unwrap_or_else(Viewport::schematic);
        self.symbol_view = Viewport::symbol();
        self.refresh_extent();

        self.mode = PaintMode::Schematic;
        self.changed = false;
        self.seed_schematic_undo();
        self.symbol_undo.clear();

        tracing::info!(
            "Loaded {:?}: {} components, {} wires",
            path,
            self.schematic.components().len(),
            self.schematic.wires().len()
        );
        Ok(())
    }

    /// Complete file text of the document as it would be saved.
    pub fn serialize(&self) -> String {
        let mut properties = self.properties.clone();
        properties.view = Some(self.schematic_view);
        write_schematic(
            &self.settings.version,
            &properties,
            &self.schematic,
            &self.symbol,
        )
    }

    /// Write the document to its file and return the number of subcircuit
    /// ports it defines.
    pub fn save(&mut self) -> Result<usize, DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::Untitled)?;
        if self.mode == PaintMode::Symbol {
            self.symbol.adjust_port_numbers(&self.schematic);
            // the saved pins become the clean state of the symbol history
            let snapshot = write_graph_sections(&self.symbol, false);
            if self.symbol_undo.current().map(|s| s.text.as_str()) != Some(snapshot.as_str()) {
                self.symbol_undo.push_snapshot(snapshot, true);
            }
            self.symbol_view.used = self.symbol.bounding_extent();
        }
        let text = self.serialize();
        std::fs::write(&path, text).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;

        self.changed = false;
        self.schematic_undo.mark_clean();
        self.symbol_undo.mark_clean();
        let ports = self.schematic.port_count();
        tracing::info!("Saved {:?} ({} ports)", path, ports);
        Ok(ports)
    }

    /// Toggle between schematic and symbol. Entering the symbol brings its
    /// pins in line with the schematic ports and draws a default symbol when
    /// there is nothing but pins.
    pub fn switch_paint_mode(&mut self) -> PaintMode {
        match self.mode {
            PaintMode::Schematic => {
                let count = self.symbol.adjust_port_numbers(&self.schematic);
                if self.symbol.paintings().len() == count {
                    self.symbol.build_default_symbol(count);
                }
                self.symbol_view.used = self.symbol.bounding_extent();
                if self.symbol_undo.is_empty() {
                    let text = write_graph_sections(&self.symbol, false);
                    self.symbol_undo.push_snapshot(text, false);
                }
                self.mode = PaintMode::Symbol;
            }
            PaintMode::Symbol => self.mode = PaintMode::Schematic,
        }
        tracing::debug!("{} switched to {:?} mode", self.name(), self.mode);
        self.mode
    }

    /// Mark the document dirty and record a snapshot of the active graph.
    pub fn record_edit(&mut self) {
        self.changed = true;
        let text = write_graph_sections(self.graph(), false);
        self.undo_stack_mut().push_snapshot(text, true);
        self.refresh_extent();
    }

    pub fn place(&mut self, element: impl Into<Element>) -> ElementId {
        let id = self.graph_mut().append(element);
        self.record_edit();
        id
    }

    fn selected_elements(&self) -> Vec<ElementId> {
        let graph = self.graph();
        graph
            .selected_ids()
            .into_iter()
            .filter(|id| graph.kind_of(*id) != Some(ElementKind::Node))
            .collect()
    }

    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selected_elements();
        let graph = self.graph_mut();
        // wire labels may already be gone with their wire
        let removed = ids
            .into_iter()
            .filter(|id| graph.remove(*id).is_some())
            .count();
        if removed > 0 {
            self.record_edit();
        }
        removed
    }

    pub fn move_selected(&mut self, dx: i32, dy: i32) -> usize {
        let moved = self.graph_mut().translate_selected(dx, dy);
        if moved > 0 {
            self.record_edit();
        }
        moved
    }

    pub fn set_property(&mut self, id: ElementId, name: &str, value: &str) -> bool {
        let applied = self.graph_mut().set_property(id, name, value);
        if applied {
            self.record_edit();
        }
        applied
    }

    /// Exchange text of the selection. With `remove` the selection is cut.
    pub fn copy_selected(&mut self, remove: bool) -> String {
        let ids = self.selected_elements();
        if ids.is_empty() {
            return String::new();
        }
        let text = write_exchange(&self.settings.version, self.graph());
        if remove {
            let graph = self.graph_mut();
            for id in ids {
                graph.remove(id);
            }
            self.record_edit();
        }
        text
    }

    /// Insert exchange text. The pasted elements become the selection.
    pub fn paste(&mut self, text: &str) -> Result<Vec<ElementId>, DocumentError> {
        let pasted = read_exchange(text, &self.settings.version, &self.resolver())?;
        let graph = self.graph_mut();
        graph.deselect_all();
        let ids = graph.absorb(pasted, true);
        if !ids.is_empty() {
            self.record_edit();
        }
        Ok(ids)
    }

    /// Step back one snapshot in the active mode. Returns false when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool, DocumentError> {
        let snapshot = self.undo_stack_mut().undo().cloned();
        self.restore(snapshot)
    }

    pub fn redo(&mut self) -> Result<bool, DocumentError> {
        let snapshot = self.undo_stack_mut().redo().cloned();
        self.restore(snapshot)
    }

    fn restore(&mut self, snapshot: Option<Snapshot>) -> Result<bool, DocumentError> {
        let Some(snapshot) = snapshot else {
            return Ok(false);
        };
        let sections = read_sections(&snapshot.text, &self.resolver())?;
        *self.graph_mut() = sections.schematic;
        self.changed = snapshot.changed;
        self.refresh_extent();
        Ok(true)
    }

    /// Subcircuit instances referencing `path`.
    pub fn subcircuit_references(&self, path: &Path) -> Vec<ElementId> {
        self.schematic.find_by_file_reference(path)
    }

    /// Rebuild one subcircuit instance for a new port count. File content is
    /// unaffected, so the dirty flag stays as it is.
    pub fn recreate_subcircuit(&mut self, id: ElementId, port_count: usize) -> bool {
        let rebuilt = self.schematic.recreate_component(id, port_count);
        if rebuilt {
            self.schematic_view.used = self.schematic.bounding_extent();
        }
        rebuilt
    }

    fn resolve_paired(&self, name: Option<&String>) -> Option<PathBuf> {
        let name = name.filter(|n| !n.is_empty())?;
        let path = Path::new(name);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.directory().join(path))
        }
    }

    pub fn data_set_path(&self) -> Option<PathBuf> {
        self.resolve_paired(self.properties.data_set.as_ref())
    }

    pub fn data_display_path(&self) -> Option<PathBuf> {
        self.resolve_paired(self.properties.data_display.as_ref())
    }

    /// Fill diagram traces from the paired dataset. A missing dataset is not
    /// an error; nothing is filled. Returns the number of filled traces.
    pub fn reload_results(&mut self) -> Result<usize, DocumentError> {
        let Some(path) = self.data_set_path() else {
            return Ok(0);
        };
        if !path.exists() {
            tracing::debug!("No dataset at {:?}", path);
            return Ok(0);
        }
        let dataset = Dataset::load(&path)?;
        let mut filled = 0;
        for diagram in self.schematic.diagrams_mut() {
            for trace in &mut diagram.traces {
                match dataset.samples(&trace.variable) {
                    Some(samples) => {
                        trace.samples = samples;
                        filled += 1;
                    }
                    None => trace.samples.clear(),
                }
            }
        }
        tracing::info!("Reloaded {} traces from {:?}", filled, path);
        Ok(filled)
    }

    pub fn fit_all(&mut self, visible_width: f64, visible_height: f64) -> bool {
        self.refresh_extent();
        self.viewport_mut().fit_all(visible_width, visible_height)
    }

    pub fn show_one(&mut self) {
        self.viewport_mut().show_one();
    }
}
