//! World generation, storage and streaming for the Voxterra engine.
//!
//! - [`noise`] and [`biome`] are the deterministic procedural layer
//! - [`generation`] turns them into chunk terrain behind the [`Generator`] trait
//! - [`placement`] and [`placer`] stamp structures into chunks
//! - [`dimension`] and [`world`] own the loaded chunks
//! - [`streaming`] loads, unloads and remeshes around a viewer
//! - [`water`] runs the deferred liquid flood rule

pub mod biome;
pub mod dimension;
pub mod generation;
pub mod noise;
pub mod placement;
pub mod placer;
pub mod streaming;
pub mod water;
pub mod world;

pub use biome::{classify, Biome, BiomeProfile, Climate, ClimateMode, ClimateSampler};
pub use dimension::{Dimension, DimensionEvent, SpawnerRequest};
pub use generation::{
    FlatGenerator, Generator, GeneratorFactory, GeneratorRegistry, GeneratorSettings,
    OverworldGenerator, TerrainConfig,
};
pub use placement::{PlacementConfig, PlacementGrid, StructurePlacement};
pub use placer::{merge_section, StructurePlacer};
pub use streaming::{ChunkStreamer, StreamingConfig, StreamingReport, Viewer};
pub use water::{WaterConfig, WaterSimulator};
pub use world::World;

/// World seed for procedural generation.
pub type WorldSeed = u64;
