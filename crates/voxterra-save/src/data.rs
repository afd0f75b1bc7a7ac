//! Persisted diff records.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voxterra_core::coords::{ChunkPos, LocalPos, WorldPos};
use voxterra_core::types::{Facing, Voxel};
use voxterra_voxel::{ChunkDiff, EntityRecord};
use voxterra_world::{Dimension, World};

use crate::Result;

/// Version string written into every save.
pub const FORMAT_VERSION: &str = "1.0";

/// Entity as written to disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySaveRecord {
    pub entity_id: String,
    pub position: WorldPos,
    /// Clockwise facing index, north = 0.
    #[serde(default)]
    pub facing: u8,
}

impl From<&EntityRecord> for EntitySaveRecord {
    fn from(record: &EntityRecord) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            position: record.position,
            facing: record.facing.index(),
        }
    }
}

impl From<&EntitySaveRecord> for EntityRecord {
    fn from(record: &EntitySaveRecord) -> Self {
        Self::new(record.entity_id.clone(), record.position, Facing::from_index(record.facing))
    }
}

/// Modified voxels and entities of one chunk.
///
/// `positions` and `voxels` are parallel arrays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkData {
    pub position: ChunkPos,
    #[serde(default)]
    pub positions: Vec<[u8; 3]>,
    #[serde(default)]
    pub voxels: Vec<Voxel>,
    #[serde(default)]
    pub entities: Vec<EntitySaveRecord>,
}

impl ChunkData {
    pub fn from_diff(position: ChunkPos, diff: &ChunkDiff) -> Self {
        Self {
            position,
            positions: diff.voxels.iter().map(|(l, _)| [l.x, l.y, l.z]).collect(),
            voxels: diff.voxels.iter().map(|&(_, v)| v).collect(),
            entities: diff.entities.iter().map(EntitySaveRecord::from).collect(),
        }
    }

    /// Rebuild the diff. Out-of-range positions and unpaired entries are
    /// dropped with a warning.
    pub fn to_diff(&self) -> ChunkDiff {
        if self.positions.len() != self.voxels.len() {
            warn!(
                chunk = ?self.position,
                positions = self.positions.len(),
                voxels = self.voxels.len(),
                "mismatched voxel arrays, extra entries ignored"
            );
        }
        let voxels: Vec<_> = self
            .positions
            .iter()
            .zip(&self.voxels)
            .filter_map(|(&[x, y, z], &voxel)| {
                let local = LocalPos::checked(i32::from(x), i32::from(y), i32::from(z));
                if local.is_none() {
                    warn!(chunk = ?self.position, x, y, z, "skipping out-of-range saved voxel");
                }
                local.map(|l| (l, voxel))
            })
            .collect();
        ChunkDiff {
            voxels,
            entities: self.entities.iter().map(EntityRecord::from).collect(),
        }
    }
}

/// All modified chunks of one dimension.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionSaveData {
    pub id: String,
    pub generator_id: String,
    #[serde(default)]
    pub chunks: Vec<ChunkData>,
}

impl DimensionSaveData {
    /// Capture every chunk of `dimension` that differs from its baseline.
    pub fn capture(dimension: &Dimension) -> Self {
        Self {
            id: dimension.id().to_string(),
            generator_id: dimension.generator().generator_id().to_string(),
            chunks: dimension
                .diffs()
                .iter()
                .map(|(pos, diff)| ChunkData::from_diff(*pos, diff))
                .collect(),
        }
    }
}

/// One save document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSaveData {
    pub seed: u64,
    #[serde(default)]
    pub active_dimension: Option<String>,
    #[serde(default)]
    pub dimensions: Vec<DimensionSaveData>,
    pub format_version: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

impl WorldSaveData {
    /// Capture the diffs of every dimension in `world`.
    pub fn capture(world: &World) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            seed: world.seed(),
            active_dimension: world.active_id().map(str::to_string),
            dimensions: world.dimensions().map(DimensionSaveData::capture).collect(),
            format_version: FORMAT_VERSION.to_string(),
            timestamp,
        }
    }

    /// Number of chunk records across all dimensions.
    pub fn chunk_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.chunks.len()).sum()
    }

    /// Reseed `world`, recreate the saved dimensions and apply every chunk
    /// diff on top of the regenerated baseline.
    ///
    /// Dimensions whose generator is unknown are skipped. Returns how many
    /// chunks were restored.
    pub fn restore_into(&self, world: &mut World) -> Result<usize> {
        world.reseed(self.seed);
        let mut restored = 0;
        for saved in &self.dimensions {
            let dimension = match world.create_dimension(&saved.id, &saved.generator_id) {
                Ok(d) => d,
                Err(e) => {
                    warn!(dimension = %saved.id, error = %e, "skipping saved dimension");
                    continue;
                }
            };
            for chunk in &saved.chunks {
                dimension.apply_diff(chunk.position, &chunk.to_diff());
                restored += 1;
            }
        }
        if let Some(active) = &self.active_dimension {
            if world.dimension(active).is_some() {
                world.set_active(active)?;
            } else {
                warn!(dimension = %active, "saved active dimension missing");
            }
        }
        debug!(seed = self.seed, restored, "restored world");
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxterra_core::types::Rgba;
    use voxterra_world::{GeneratorRegistry, GeneratorSettings};

    fn world() -> World {
        World::new(12345, GeneratorRegistry::with_defaults(GeneratorSettings::default()))
    }

    #[test]
    fn unmodified_chunks_are_not_captured() {
        let mut w = world();
        let dim = w.create_dimension("main", "flat").unwrap();
        dim.get_or_create_chunk(ChunkPos::new(0, 2, 0));
        dim.get_or_create_chunk(ChunkPos::new(1, 2, 0));
        dim.set_voxel(WorldPos::new(3, 33, 3), Voxel::solid(Rgba::RED));

        let data = WorldSaveData::capture(&w);
        assert_eq!(data.chunk_count(), 1);
        assert_eq!(data.dimensions[0].chunks[0].position, ChunkPos::new(0, 2, 0));
        assert_eq!(data.active_dimension.as_deref(), Some("main"));
        assert_eq!(data.format_version, FORMAT_VERSION);
    }

    #[test]
    fn out_of_range_positions_are_dropped() {
        let data = ChunkData {
            position: ChunkPos::new(0, 0, 0),
            positions: vec![[1, 2, 3], [16, 0, 0], [4, 4, 4]],
            voxels: vec![Voxel::solid(Rgba::RED); 2],
            entities: Vec::new(),
        };
        let diff = data.to_diff();
        assert_eq!(diff.voxels, vec![(LocalPos::new(1, 2, 3), Voxel::solid(Rgba::RED))]);
    }

    #[test]
    fn restore_applies_diffs_and_active_dimension() {
        let mut w = world();
        w.create_dimension("main", "flat").unwrap();
        let creative = w.create_dimension("creative", "flat").unwrap();
        creative.get_or_create_chunk(ChunkPos::new(0, 2, 0));
        creative.set_voxel(WorldPos::new(5, 40, 5), Voxel::solid(Rgba::RED));
        w.set_active("creative").unwrap();
        let data = WorldSaveData::capture(&w);

        let mut fresh = World::new(1, GeneratorRegistry::with_defaults(GeneratorSettings::default()));
        assert_eq!(data.restore_into(&mut fresh).unwrap(), 1);
        assert_eq!(fresh.seed(), 12345);
        assert_eq!(fresh.active_id(), Some("creative"));
        let dim = fresh.active_dimension().unwrap();
        assert_eq!(dim.get_voxel(WorldPos::new(5, 40, 5)), Voxel::solid(Rgba::RED));
    }

    #[test]
    fn unknown_generator_skips_the_dimension() {
        let data = WorldSaveData {
            seed: 3,
            active_dimension: Some("odd".into()),
            dimensions: vec![DimensionSaveData {
                id: "odd".into(),
                generator_id: "nether".into(),
                chunks: Vec::new(),
            }],
            format_version: FORMAT_VERSION.into(),
            timestamp: 0,
        };
        let mut w = world();
        assert_eq!(data.restore_into(&mut w).unwrap(), 0);
        assert!(w.dimension("odd").is_none());
        assert!(w.active_id().is_none());
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = r#"{"seed": 9, "format_version": "1.0"}"#;
        let data: WorldSaveData = serde_json::from_str(json).unwrap();
        assert_eq!(data.seed, 9);
        assert!(data.dimensions.is_empty());
        assert_eq!(data.timestamp, 0);
    }
}
