//! JSON structure templates.
//!
//! A template describes the voxel volume as y-major layers of text rows. Each
//! layer is a list of `sz` rows, each row a string of `sx` palette keys; `.`
//! and space are air.
//!
//! ```json
//! {
//!   "id": "pillar",
//!   "kind": "environment",
//!   "size": [1, 2, 1],
//!   "palette": { "s": { "block": 1 } },
//!   "layers": [["s"], ["s"]],
//!   "weight": 2,
//!   "rotations": [0, 90],
//!   "generators": ["overworld"]
//! }
//! ```

use crate::data::{
    structure_volume, ArchitectureInfo, EntityPlacement, MobEntry, StructureData, StructureError, StructureKind,
    MAX_STRUCTURE_VOLUME,
};
use crate::rotation::RotationSet;
use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use voxterra_core::types::{BlockId, BlockPalette, Facing, Rgba, Voxel, VoxelKind};

/// One palette entry: either a block id or an explicit kind + color.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PaletteEntry {
    #[serde(default)]
    pub block: Option<u16>,
    #[serde(default)]
    pub kind: Option<VoxelKind>,
    #[serde(default)]
    pub color: Option<[u8; 4]>,
}

impl PaletteEntry {
    fn resolve(&self, palette: &BlockPalette) -> Voxel {
        if let Some(block) = self.block {
            return palette.voxel(BlockId(block));
        }
        let [r, g, b, a] = self.color.unwrap_or([255, 255, 255, 255]);
        let color = Rgba::new(r, g, b, a);
        match self.kind.unwrap_or(VoxelKind::Solid) {
            VoxelKind::Air => Voxel::AIR,
            VoxelKind::Solid => Voxel::solid(color),
            VoxelKind::Liquid => Voxel::liquid(color),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementTemplate {
    pub entity_id: String,
    pub local: [i32; 3],
    #[serde(default)]
    pub facing: Facing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchitectureTemplate {
    pub spawn_min: [i32; 3],
    pub spawn_max: [i32; 3],
    #[serde(default)]
    pub mobs: Vec<MobEntry>,
}

fn default_weight() -> u32 {
    1
}

fn default_rotations() -> Vec<u32> {
    vec![0, 90, 180, 270]
}

/// On-disk structure template.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StructureTemplate {
    pub id: String,
    #[serde(default)]
    pub kind: StructureKind,
    pub size: [u32; 3],
    #[serde(default)]
    pub palette: BTreeMap<String, PaletteEntry>,
    pub layers: Vec<Vec<String>>,
    #[serde(default)]
    pub placements: Vec<PlacementTemplate>,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default = "default_rotations")]
    pub rotations: Vec<u32>,
    #[serde(default)]
    pub generators: Vec<String>,
    #[serde(default)]
    pub architecture: Option<ArchitectureTemplate>,
}

impl StructureTemplate {
    /// Parse template JSON.
    pub fn from_json(text: &str) -> Result<Self, StructureError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the immutable structure, resolving block ids through `palette`.
    pub fn build(&self, palette: &BlockPalette) -> Result<StructureData, StructureError> {
        let size = UVec3::from_array(self.size);
        let voxels = self.decode_layers(palette, size)?;

        let mut data = StructureData::new(self.id.clone(), self.kind, size, voxels)?
            .with_weight(self.weight)
            .with_rotations(RotationSet::from_degrees(&self.rotations));
        for generator in &self.generators {
            data = data.with_generator(generator.clone());
        }
        for placement in &self.placements {
            data = data.with_placement(EntityPlacement {
                entity_id: placement.entity_id.clone(),
                local: IVec3::from_array(placement.local),
                facing: placement.facing,
            })?;
        }
        if let Some(arch) = &self.architecture {
            data = data.with_architecture(ArchitectureInfo {
                spawn_min: IVec3::from_array(arch.spawn_min),
                spawn_max: IVec3::from_array(arch.spawn_max),
                mobs: arch.mobs.clone(),
            });
        }
        Ok(data)
    }

    fn decode_layers(&self, palette: &BlockPalette, size: UVec3) -> Result<Vec<Voxel>, StructureError> {
        let bad = |reason: String| StructureError::BadLayout {
            id: self.id.clone(),
            reason,
        };
        if self.layers.len() != size.y as usize {
            return Err(bad(format!(
                "expected {} layers, found {}",
                size.y,
                self.layers.len()
            )));
        }

        let mut keys = BTreeMap::new();
        for (key, entry) in &self.palette {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => {
                    keys.insert(c, entry.resolve(palette));
                }
                _ => return Err(bad(format!("palette key '{key}' is not a single character"))),
            }
        }

        let Some(volume) = structure_volume(size) else {
            return Err(StructureError::TooLarge {
                id: self.id.clone(),
                size,
                max: MAX_STRUCTURE_VOLUME,
            });
        };
        let (sx, sy, sz) = (size.x as usize, size.y as usize, size.z as usize);
        for (y, layer) in self.layers.iter().enumerate() {
            if layer.len() != sz {
                return Err(bad(format!("layer {y} has {} rows, expected {sz}", layer.len())));
            }
            for (z, row) in layer.iter().enumerate() {
                let count = row.chars().count();
                if count != sx {
                    return Err(bad(format!("layer {y} row {z} has {count} cells, expected {sx}")));
                }
            }
        }

        let mut voxels = vec![Voxel::AIR; volume];
        for (y, layer) in self.layers.iter().enumerate() {
            for (z, row) in layer.iter().enumerate() {
                for (x, key) in row.chars().enumerate() {
                    if key == '.' || key == ' ' {
                        continue;
                    }
                    let voxel = keys.get(&key).copied().ok_or_else(|| {
                        StructureError::UnknownPaletteKey {
                            id: self.id.clone(),
                            key,
                        }
                    })?;
                    voxels[x + sx * (y + sy * z)] = voxel;
                }
            }
        }
        Ok(voxels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL: &str = r#"{
        "id": "tiny_well",
        "kind": "architecture",
        "size": [3, 2, 3],
        "palette": {
            "c": { "block": 21 },
            "w": { "kind": "Liquid", "color": [58, 103, 178, 160] }
        },
        "layers": [
            ["ccc", "cwc", "ccc"],
            ["c.c", "...", "c.c"]
        ],
        "placements": [{ "entity_id": "bucket", "local": [1, 1, 1], "facing": "South" }],
        "weight": 4,
        "rotations": [0, 180],
        "generators": ["overworld", "grassland"],
        "architecture": {
            "spawn_min": [-4, 0, -4],
            "spawn_max": [6, 2, 6],
            "mobs": [{ "mob_id": "villager", "initial_count": 2, "max_count": 4, "interval": 30.0 }]
        }
    }"#;

    #[test]
    fn parses_and_builds_template() {
        let data = StructureTemplate::from_json(WELL)
            .unwrap()
            .build(&BlockPalette::standard())
            .unwrap();
        assert_eq!(data.id(), "tiny_well");
        assert_eq!(data.kind(), StructureKind::Architecture);
        assert_eq!(data.size(), UVec3::new(3, 2, 3));
        assert_eq!(data.weight(), 4);
        assert_eq!(data.rotations(), RotationSet::NORTH | RotationSet::SOUTH);
        assert!(data.supports_generator("grassland"));
        assert!(data.voxel_at(IVec3::new(1, 0, 1)).unwrap().is_liquid());
        assert!(data.voxel_at(IVec3::new(1, 1, 0)).unwrap().is_air());
        assert!(data.voxel_at(IVec3::new(0, 1, 0)).unwrap().is_solid());
        assert_eq!(data.placements()[0].facing, Facing::South);
        assert_eq!(data.architecture().unwrap().mobs[0].max_count, 4);
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"{ "id": "dot", "size": [1, 1, 1], "palette": { "x": {} }, "layers": [["x"]] }"#;
        let data = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard())
            .unwrap();
        assert_eq!(data.weight(), 1);
        assert_eq!(data.rotations(), RotationSet::all());
        assert_eq!(data.kind(), StructureKind::Environment);
        assert!(data.voxel_at(IVec3::ZERO).unwrap().is_solid());
    }

    #[test]
    fn unknown_palette_key_is_an_error() {
        let text = r#"{ "id": "oops", "size": [1, 1, 1], "layers": [["q"]] }"#;
        let err = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard());
        assert!(matches!(err, Err(StructureError::UnknownPaletteKey { key: 'q', .. })));
    }

    #[test]
    fn wrong_row_length_is_an_error() {
        let text = r#"{ "id": "short", "size": [2, 1, 1], "layers": [["."]] }"#;
        let err = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard());
        assert!(matches!(err, Err(StructureError::BadLayout { .. })));
    }

    #[test]
    fn oversized_extents_fail_before_allocating() {
        let text = r#"{ "id": "huge", "size": [4000000000, 1, 1], "layers": [["."]] }"#;
        let err = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard());
        assert!(matches!(err, Err(StructureError::TooLarge { .. })));

        let text = r#"{ "id": "wide", "size": [65536, 2, 65536], "layers": [["."], ["."]] }"#;
        let err = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard());
        assert!(matches!(err, Err(StructureError::TooLarge { .. })));
    }

    #[test]
    fn every_layer_is_checked_before_decoding() {
        let text = r#"{ "id": "ragged", "size": [1, 2, 1], "palette": { "s": {} }, "layers": [["s"], ["s", "s"]] }"#;
        let err = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard());
        assert!(matches!(err, Err(StructureError::BadLayout { .. })));
    }

    #[test]
    fn unknown_block_resolves_to_air() {
        let text = r#"{ "id": "ghost", "size": [1, 1, 1], "palette": { "g": { "block": 4000 } }, "layers": [["g"]] }"#;
        let data = StructureTemplate::from_json(text)
            .unwrap()
            .build(&BlockPalette::standard())
            .unwrap();
        assert!(data.voxel_at(IVec3::ZERO).unwrap().is_air());
    }
}
