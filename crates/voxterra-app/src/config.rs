//! Engine configuration.

use std::path::PathBuf;

use voxterra_save::SaveConfig;
use voxterra_world::{PlacementConfig, StreamingConfig, TerrainConfig, WaterConfig, WorldSeed};

/// Everything needed to build an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// World seed.
    pub seed: WorldSeed,
    /// Dimension created at startup.
    pub dimension_id: String,
    /// Generator driving the startup dimension.
    pub generator_id: String,
    pub terrain: TerrainConfig,
    pub placement: PlacementConfig,
    pub streaming: StreamingConfig,
    pub water: WaterConfig,
    pub save: SaveConfig,
    /// Extra `*.json` structure templates, loaded on top of the built-ins.
    pub structure_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            dimension_id: "overworld".to_string(),
            generator_id: "grassland".to_string(),
            terrain: TerrainConfig::default(),
            placement: PlacementConfig::default(),
            streaming: StreamingConfig::default(),
            water: WaterConfig::default(),
            save: SaveConfig::default(),
            structure_dir: None,
        }
    }
}

impl EngineConfig {
    /// Set the world seed.
    pub fn with_seed(mut self, seed: WorldSeed) -> Self {
        self.seed = seed;
        self
    }

    /// Set the startup dimension and its generator.
    pub fn with_dimension(mut self, dimension_id: impl Into<String>, generator_id: impl Into<String>) -> Self {
        self.dimension_id = dimension_id.into();
        self.generator_id = generator_id.into();
        self
    }

    pub fn with_terrain(mut self, terrain: TerrainConfig) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_streaming(mut self, streaming: StreamingConfig) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn with_water(mut self, water: WaterConfig) -> Self {
        self.water = water;
        self
    }

    pub fn with_save(mut self, save: SaveConfig) -> Self {
        self.save = save;
        self
    }

    pub fn with_structure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.structure_dir = Some(dir.into());
        self
    }
}
