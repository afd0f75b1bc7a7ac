//! Deterministic structure placement grid.
//!
//! The world is divided into square cells, one grid per structure kind. Each
//! cell makes at most one placement decision, driven entirely by a PRNG seeded
//! from `(cell x, cell z, kind, generator id, world seed)`, so the decision
//! does not depend on which chunk asks first or on any cache.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use voxterra_core::constants::CHUNK_SIZE_I32;
use voxterra_core::coords::{ChunkPos, WorldPos};
use voxterra_structure::{Rotation, StructureData, StructureKind, StructureRegistry};

use crate::noise::{hash2, mix64, str_hash};
use crate::WorldSeed;

/// Grid resolutions per structure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Cell edge for environment decorations, in voxels.
    pub environment_cell: i64,
    /// Cell edge for architecture set-pieces, in voxels.
    pub architecture_cell: i64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            environment_cell: 16,
            architecture_cell: 128,
        }
    }
}

impl PlacementConfig {
    /// Set the environment cell size (clamped to at least 1).
    pub fn with_environment_cell(mut self, cell: i64) -> Self {
        self.environment_cell = cell.max(1);
        self
    }

    /// Set the architecture cell size (clamped to at least 1).
    pub fn with_architecture_cell(mut self, cell: i64) -> Self {
        self.architecture_cell = cell.max(1);
        self
    }

    /// Cell edge for a kind.
    pub fn cell_size(&self, kind: StructureKind) -> i64 {
        match kind {
            StructureKind::Environment => self.environment_cell.max(1),
            StructureKind::Architecture => self.architecture_cell.max(1),
        }
    }
}

/// One placement decision: a structure, where its local origin lands and how
/// it is turned.
#[derive(Clone, Debug)]
pub struct StructurePlacement {
    pub structure: Arc<StructureData>,
    pub origin: WorldPos,
    pub rotation: Rotation,
}

impl PartialEq for StructurePlacement {
    fn eq(&self, other: &Self) -> bool {
        self.structure.id() == other.structure.id()
            && self.origin == other.origin
            && self.rotation == other.rotation
    }
}

impl Eq for StructurePlacement {}

impl StructurePlacement {
    pub fn new(structure: Arc<StructureData>, origin: WorldPos, rotation: Rotation) -> Self {
        Self {
            structure,
            origin,
            rotation,
        }
    }

    /// Id of the placed structure.
    pub fn id(&self) -> &str {
        self.structure.id()
    }

    /// The template rebuilt in its placed orientation.
    pub fn rotated_structure(&self) -> StructureData {
        self.structure.rotated(self.rotation)
    }

    /// World-space bounds of the rotated volume: inclusive min, exclusive max.
    pub fn bounds(&self) -> (WorldPos, WorldPos) {
        let size = self.rotation.rotate_size(self.structure.size());
        let max = self
            .origin
            .offset(i64::from(size.x), i64::from(size.y), i64::from(size.z));
        (self.origin, max)
    }

    /// Chunks whose volume intersects the rotated structure.
    pub fn chunks(&self) -> Vec<ChunkPos> {
        let (min, max) = self.bounds();
        if max.x <= min.x || max.y <= min.y || max.z <= min.z {
            return Vec::new();
        }
        let lo = min.chunk_pos();
        let hi = max.offset(-1, -1, -1).chunk_pos();
        let mut out = Vec::new();
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    out.push(ChunkPos::new(x, y, z));
                }
            }
        }
        out
    }

    /// Whether the rotated volume overlaps a chunk.
    pub fn intersects_chunk(&self, pos: ChunkPos) -> bool {
        let (min, max) = self.bounds();
        let c0 = pos.to_world_pos();
        let c1 = c0.offset(
            i64::from(CHUNK_SIZE_I32),
            i64::from(CHUNK_SIZE_I32),
            i64::from(CHUNK_SIZE_I32),
        );
        min.x < c1.x && max.x > c0.x && min.y < c1.y && max.y > c0.y && min.z < c1.z && max.z > c0.z
    }
}

/// Placement decisions for one generator.
#[derive(Clone, Debug)]
pub struct PlacementGrid {
    seed: WorldSeed,
    generator_id: String,
    structures: Arc<StructureRegistry>,
    config: PlacementConfig,
}

impl PlacementGrid {
    pub fn new(
        seed: WorldSeed,
        generator_id: impl Into<String>,
        structures: Arc<StructureRegistry>,
        config: PlacementConfig,
    ) -> Self {
        Self {
            seed,
            generator_id: generator_id.into(),
            structures,
            config,
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn structures(&self) -> &Arc<StructureRegistry> {
        &self.structures
    }

    /// Seed for a cell's PRNG.
    pub fn cell_hash(&self, grid_x: i64, grid_z: i64, kind: StructureKind) -> u64 {
        let seed = mix64(self.seed ^ str_hash(&self.generator_id));
        hash2(seed, grid_x, grid_z, u64::from(kind.index()) + 1)
    }

    /// The decision made by one cell, if any candidate exists.
    ///
    /// `height` maps a world column to its terrain surface; the structure
    /// stands one voxel above it.
    pub fn placement_in_cell(
        &self,
        grid_x: i64,
        grid_z: i64,
        kind: StructureKind,
        height: &dyn Fn(i64, i64) -> i32,
    ) -> Option<StructurePlacement> {
        let candidates = self.structures.candidates(&self.generator_id, kind);
        let total: u64 = candidates.iter().map(|s| u64::from(s.weight())).sum();
        if total == 0 {
            return None;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.cell_hash(grid_x, grid_z, kind));
        let roll = rng.gen_range(0..total);
        let mut acc = 0u64;
        let structure = candidates.into_iter().find(|s| {
            acc += u64::from(s.weight());
            roll < acc
        })?;

        let cell = self.config.cell_size(kind);
        let x = grid_x * cell + rng.gen_range(0..cell);
        let z = grid_z * cell + rng.gen_range(0..cell);
        let y = i64::from(height(x, z)) + 1;

        let allowed = structure.rotations().rotations();
        let rotation = if allowed.is_empty() {
            Rotation::North
        } else {
            allowed[rng.gen_range(0..allowed.len())]
        };

        Some(StructurePlacement::new(structure, WorldPos::new(x, y, z), rotation))
    }

    /// Decisions of every cell overlapping the columns `[min, max)`, for both
    /// kinds, environment first. Cells are visited in `z` then `x` order.
    pub fn placements_in_area(
        &self,
        min_x: i64,
        min_z: i64,
        max_x: i64,
        max_z: i64,
        height: &dyn Fn(i64, i64) -> i32,
    ) -> Vec<StructurePlacement> {
        let mut out = Vec::new();
        if max_x <= min_x || max_z <= min_z {
            return out;
        }
        for kind in [StructureKind::Environment, StructureKind::Architecture] {
            let cell = self.config.cell_size(kind);
            let (gx0, gx1) = (min_x.div_euclid(cell), (max_x - 1).div_euclid(cell));
            let (gz0, gz1) = (min_z.div_euclid(cell), (max_z - 1).div_euclid(cell));
            for gz in gz0..=gz1 {
                for gx in gx0..=gx1 {
                    out.extend(self.placement_in_cell(gx, gz, kind, height));
                }
            }
        }
        out
    }

    /// Decisions of the cells overlapping a chunk's footprint.
    pub fn for_chunk(&self, pos: ChunkPos, height: &dyn Fn(i64, i64) -> i32) -> Vec<StructurePlacement> {
        let base = pos.to_world_pos();
        let edge = i64::from(CHUNK_SIZE_I32);
        self.placements_in_area(base.x, base.z, base.x + edge, base.z + edge, height)
    }

    /// Decisions whose structure may reach into a chunk's footprint.
    ///
    /// The footprint is grown toward negative x and z by the largest
    /// template extent, since a structure extends from its origin toward
    /// positive x and z only. Results are filtered to those actually
    /// overlapping the chunk column.
    pub fn touching_chunk(&self, pos: ChunkPos, height: &dyn Fn(i64, i64) -> i32) -> Vec<StructurePlacement> {
        let base = pos.to_world_pos();
        let edge = i64::from(CHUNK_SIZE_I32);
        let reach = i64::from(self.structures.max_horizontal_extent());
        let mut out =
            self.placements_in_area(base.x - reach, base.z - reach, base.x + edge, base.z + edge, height);
        out.retain(|p| {
            let (min, max) = p.bounds();
            min.x < base.x + edge && max.x > base.x && min.z < base.z + edge && max.z > base.z
        });
        out
    }
}
