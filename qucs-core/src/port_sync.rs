//! Keeping placed subcircuits in step with their schematic.
//!
//! When a schematic that defines subcircuit ports is saved, every open
//! document that places it gets its instances rebuilt for the new port
//! count. Matching is by full path or by bare file name, so same-named
//! files in different directories are both updated.

use std::path::Path;

use crate::document_set::DocumentSet;
use crate::element::ElementId;

impl DocumentSet {
    /// Rebuild every instance of the subcircuit `path` in all open documents.
    /// Returns how many instances were rebuilt. The current document stays
    /// current.
    pub fn sync_ports(&mut self, path: &Path, port_count: usize) -> usize {
        if port_count == 0 {
            return 0;
        }
        let targets: Vec<(usize, Vec<ElementId>)> = self
            .docs
            .iter()
            .enumerate()
            .map(|(i, doc)| (i, doc.subcircuit_references(path)))
            .filter(|(_, ids)| !ids.is_empty())
            .collect();

        let mut rebuilt = 0;
        for (index, ids) in targets {
            let doc = &mut self.docs[index];
            for id in ids {
                if doc.recreate_subcircuit(id, port_count) {
                    rebuilt += 1;
                }
            }
        }
        if rebuilt > 0 {
            tracing::info!(
                "Updated {} instances of {:?} to {} ports",
                rebuilt,
                path,
                port_count
            );
        }
        rebuilt
    }
}
