//! The set of dimensions sharing one seed.

use hashbrown::HashMap;
use tracing::{info, warn};
use voxterra_core::{Error, Result};

use crate::dimension::Dimension;
use crate::generation::GeneratorRegistry;
use crate::WorldSeed;

/// A world: a seed, the generator registry and the dimensions created from
/// it, one of which is active.
#[derive(Debug)]
pub struct World {
    seed: WorldSeed,
    registry: GeneratorRegistry,
    dimensions: HashMap<String, Dimension>,
    active: Option<String>,
}

impl World {
    pub fn new(seed: WorldSeed, registry: GeneratorRegistry) -> Self {
        Self {
            seed,
            registry,
            dimensions: HashMap::new(),
            active: None,
        }
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Drop every dimension and switch to a new seed.
    ///
    /// Dimensions have to be recreated afterwards; their generators are
    /// bound to the seed they were built with.
    pub fn reseed(&mut self, seed: WorldSeed) {
        info!(old = self.seed, new = seed, "reseeding world");
        self.seed = seed;
        self.dimensions.clear();
        self.active = None;
    }

    /// Create a dimension driven by `generator_id`, or return the existing
    /// one with that id.
    ///
    /// The first dimension created becomes active.
    pub fn create_dimension(&mut self, id: &str, generator_id: &str) -> Result<&mut Dimension> {
        if !self.dimensions.contains_key(id) {
            let generator = self.registry.create(generator_id, self.seed)?;
            info!(dimension = id, generator = generator_id, seed = self.seed, "created dimension");
            self.dimensions.insert(id.to_string(), Dimension::new(id, generator));
            if self.active.is_none() {
                self.active = Some(id.to_string());
            }
        } else if let Some(existing) = self.dimensions.get(id) {
            if existing.generator().generator_id() != generator_id {
                warn!(
                    dimension = id,
                    existing = existing.generator().generator_id(),
                    requested = generator_id,
                    "dimension exists with another generator, reusing it"
                );
            }
        }
        self.dimensions
            .get_mut(id)
            .ok_or_else(|| Error::UnknownDimension(id.to_string()))
    }

    pub fn dimension(&self, id: &str) -> Option<&Dimension> {
        self.dimensions.get(id)
    }

    pub fn dimension_mut(&mut self, id: &str) -> Option<&mut Dimension> {
        self.dimensions.get_mut(id)
    }

    /// Dimension ids, sorted.
    pub fn dimension_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.dimensions.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Make an existing dimension the active one.
    pub fn set_active(&mut self, id: &str) -> Result<()> {
        if !self.dimensions.contains_key(id) {
            warn!(dimension = id, "cannot activate unknown dimension");
            return Err(Error::UnknownDimension(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_dimension(&self) -> Option<&Dimension> {
        self.active.as_deref().and_then(|id| self.dimensions.get(id))
    }

    pub fn active_dimension_mut(&mut self) -> Option<&mut Dimension> {
        let id = self.active.as_deref()?;
        self.dimensions.get_mut(id)
    }

    /// Iterate dimensions in id order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        let mut dims: Vec<_> = self.dimensions.values().collect();
        dims.sort_unstable_by(|a, b| a.id().cmp(b.id()));
        dims.into_iter()
    }

    pub fn dimensions_mut(&mut self) -> impl Iterator<Item = &mut Dimension> {
        self.dimensions.values_mut()
    }
}
