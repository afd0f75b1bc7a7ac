//! Worlds, chunks and files for tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use glam::UVec3;
use voxterra_core::coords::{ChunkPos, LocalPos};
use voxterra_core::types::{Rgba, Voxel};
use voxterra_mesh::MeshInput;
use voxterra_structure::{StructureData, StructureKind};
use voxterra_voxel::Chunk;
use voxterra_world::{
    Dimension, Generator, GeneratorRegistry, GeneratorSettings, OverworldGenerator, StructurePlacement, World,
    WorldSeed,
};

use crate::Result;

/// Generator that leaves every chunk Air and places nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidGenerator {
    pub seed: WorldSeed,
}

impl Generator for VoidGenerator {
    fn generator_id(&self) -> &str {
        "void"
    }

    fn seed(&self) -> WorldSeed {
        self.seed
    }

    fn generate_chunk_terrain(&self, _chunk: &mut Chunk) {}

    fn structures_for_chunk(&self, _pos: ChunkPos) -> Vec<StructurePlacement> {
        Vec::new()
    }

    fn sky_color(&self) -> Rgba {
        Rgba::rgb(0, 0, 0)
    }

    fn terrain_height(&self, _x: i64, _z: i64) -> i32 {
        i32::MIN
    }
}

/// Dimension backed by [`VoidGenerator`].
pub fn void_dimension() -> Dimension {
    Dimension::new("void", Box::new(VoidGenerator::default()))
}

/// Dimension backed by the `grassland` preset with default settings.
pub fn grassland_dimension(seed: WorldSeed) -> Dimension {
    let settings = GeneratorSettings::default();
    Dimension::new("grassland", Box::new(OverworldGenerator::grassland(seed, &settings)))
}

/// World with the default presets plus `"void"`.
pub fn test_world(seed: WorldSeed) -> World {
    let mut registry = GeneratorRegistry::with_defaults(GeneratorSettings::default());
    registry.register("void", |seed, _| Box::new(VoidGenerator { seed }));
    World::new(seed, registry)
}

/// 3x3x3 all-solid red environment structure.
pub fn red_cube() -> StructureData {
    let voxels = vec![Voxel::solid(Rgba::RED); 27];
    match StructureData::new("red_cube", StructureKind::Environment, UVec3::splat(3), voxels) {
        Ok(s) => s,
        Err(e) => panic!("red cube fixture is malformed: {e}"),
    }
}

/// Chunk whose voxels are given by `f`, written as baseline.
pub fn chunk_from_fn(pos: ChunkPos, f: impl Fn(LocalPos) -> Voxel) -> Chunk {
    let mut chunk = Chunk::new(pos);
    for local in Chunk::local_positions() {
        chunk.set_generated(local, f(local));
    }
    chunk
}

/// Mesh input whose padded cells, `-1..=16` on every axis, are given by `f`.
pub fn input_from_fn(pos: ChunkPos, f: impl Fn(i32, i32, i32) -> Voxel) -> MeshInput {
    let mut input = MeshInput::empty(pos);
    for z in -1..=16 {
        for y in -1..=16 {
            for x in -1..=16 {
                input.set(x, y, z, f(x, y, z));
            }
        }
    }
    input
}

/// Unique directory under the system temp dir, removed on drop.
#[derive(Debug)]
pub struct TempSaveDir {
    path: PathBuf,
}

impl TempSaveDir {
    pub fn new(tag: &str) -> Result<Self> {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("voxterra-{tag}-{}-{n}", std::process::id()));
        if path.exists() {
            std::fs::remove_dir_all(&path)?;
        }
        std::fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempSaveDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
