//! Structure registry keyed by string id.

use crate::builtin;
use crate::data::{StructureData, StructureError, StructureKind};
use crate::template::StructureTemplate;
use hashbrown::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use voxterra_core::types::BlockPalette;

/// Registry of structure templates.
///
/// Iteration order is registration order, which keeps weighted selection
/// reproducible across runs.
#[derive(Debug, Default)]
pub struct StructureRegistry {
    order: Vec<Arc<StructureData>>,
    by_id: HashMap<String, usize>,
}

impl StructureRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in templates.
    pub fn with_builtins(palette: &BlockPalette) -> Self {
        let mut registry = Self::new();
        for structure in builtin::all(palette) {
            registry.register(structure);
        }
        registry
    }

    /// Register a template, replacing any previous one with the same id.
    pub fn register(&mut self, structure: StructureData) {
        let id = structure.id().to_owned();
        let structure = Arc::new(structure);
        if let Some(&index) = self.by_id.get(&id) {
            debug!(id = %id, "replacing structure template");
            self.order[index] = structure;
        } else {
            self.by_id.insert(id, self.order.len());
            self.order.push(structure);
        }
    }

    /// Look up a template by id.
    pub fn get(&self, id: &str) -> Option<&Arc<StructureData>> {
        self.by_id.get(id).map(|&i| &self.order[i])
    }

    /// Look up a template by id, logging unknown ids.
    pub fn resolve(&self, id: &str) -> Option<Arc<StructureData>> {
        let found = self.get(id).cloned();
        if found.is_none() {
            warn!(id, "unknown structure id, skipping");
        }
        found
    }

    /// Spawnable templates for a generator and kind, in registration order.
    pub fn candidates(&self, generator_id: &str, kind: StructureKind) -> Vec<Arc<StructureData>> {
        self.order
            .iter()
            .filter(|s| s.kind() == kind && s.weight() > 0 && s.supports_generator(generator_id))
            .cloned()
            .collect()
    }

    /// Largest horizontal extent of any template, in voxels.
    pub fn max_horizontal_extent(&self) -> u32 {
        self.order
            .iter()
            .map(|s| s.size().x.max(s.size().z))
            .max()
            .unwrap_or(0)
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All templates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StructureData>> {
        self.order.iter()
    }

    /// Load every `*.json` template in a directory.
    ///
    /// Files are read in name order. Malformed templates are skipped with a
    /// warning; only failure to list the directory is an error. Returns the
    /// number of templates registered.
    pub fn load_dir(&mut self, dir: &Path, palette: &BlockPalette) -> Result<usize, StructureError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match Self::load_file(&path, palette) {
                Ok(structure) => {
                    debug!(id = structure.id(), path = %path.display(), "loaded structure template");
                    self.register(structure);
                    loaded += 1;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping structure template"),
            }
        }
        info!(dir = %dir.display(), loaded, "structure templates loaded");
        Ok(loaded)
    }

    fn load_file(path: &Path, palette: &BlockPalette) -> Result<StructureData, StructureError> {
        let text = std::fs::read_to_string(path)?;
        StructureTemplate::from_json(&text)?.build(palette)
    }
}
