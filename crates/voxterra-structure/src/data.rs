//! Structure template data model.

use crate::rotation::{Rotation, RotationSet};
use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use voxterra_core::types::{Facing, Voxel};

/// Errors raised while building or loading structure templates.
#[derive(Error, Debug)]
pub enum StructureError {
    /// Voxel array does not match the declared extents.
    #[error("structure '{id}': expected {expected} voxels, got {actual}")]
    SizeMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Zero-sized extents.
    #[error("structure '{0}' has an empty size")]
    EmptySize(String),

    /// An entity placement lies outside the structure volume.
    #[error("structure '{id}': placement '{entity_id}' at {local} is outside the volume")]
    PlacementOutOfBounds {
        id: String,
        entity_id: String,
        local: IVec3,
    },

    /// A template layer references a palette key that was never declared.
    #[error("structure '{id}': unknown palette key '{key}'")]
    UnknownPaletteKey { id: String, key: char },

    /// Template layers have the wrong shape.
    #[error("structure '{id}': {reason}")]
    BadLayout { id: String, reason: String },

    /// Template JSON could not be parsed.
    #[error("template parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Extents exceed [`MAX_STRUCTURE_VOLUME`].
    #[error("structure '{id}': size {size} exceeds {max} voxels")]
    TooLarge { id: String, size: UVec3, max: usize },

    /// Template file could not be read.
    #[error("template I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Largest voxel volume a template may declare.
pub const MAX_STRUCTURE_VOLUME: usize = 64 * 64 * 64;

/// Voxel count of `size`, `None` when it overflows or exceeds
/// [`MAX_STRUCTURE_VOLUME`].
pub fn structure_volume(size: UVec3) -> Option<usize> {
    (size.x as usize)
        .checked_mul(size.y as usize)?
        .checked_mul(size.z as usize)
        .filter(|&v| v <= MAX_STRUCTURE_VOLUME)
}

/// Which placement grid a structure belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Small decorations (trees, rocks) on the fine grid.
    #[default]
    Environment,
    /// Set-pieces (ruins, wells) on the coarse grid.
    Architecture,
}

impl StructureKind {
    /// Stable discriminant used in placement hashing.
    #[inline]
    pub const fn index(self) -> u32 {
        match self {
            StructureKind::Environment => 0,
            StructureKind::Architecture => 1,
        }
    }
}

/// An entity carried by a structure, in structure-local coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntityPlacement {
    pub entity_id: String,
    pub local: IVec3,
    pub facing: Facing,
}

/// One mob type run by an architecture spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MobEntry {
    pub mob_id: String,
    /// Mobs spawned as soon as the spawner starts.
    pub initial_count: u32,
    /// Upper bound the spawner tops up to.
    pub max_count: u32,
    /// Seconds between top-up spawns.
    pub interval: f32,
}

/// Spawner metadata for architecture structures.
///
/// The spawn box is inclusive and in structure-local coordinates; it may
/// extend past the structure volume.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchitectureInfo {
    pub spawn_min: IVec3,
    pub spawn_max: IVec3,
    pub mobs: Vec<MobEntry>,
}

/// Immutable structure template.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureData {
    id: String,
    kind: StructureKind,
    size: UVec3,
    voxels: Vec<Voxel>,
    placements: Vec<EntityPlacement>,
    weight: u32,
    rotations: RotationSet,
    generators: Vec<String>,
    architecture: Option<ArchitectureInfo>,
}

impl StructureData {
    /// Build a template, checking the voxel count and placement bounds.
    ///
    /// Voxels are ordered `x + sx * (y + sy * z)`.
    pub fn new(
        id: impl Into<String>,
        kind: StructureKind,
        size: UVec3,
        voxels: Vec<Voxel>,
    ) -> Result<Self, StructureError> {
        let id = id.into();
        if size.min_element() == 0 {
            return Err(StructureError::EmptySize(id));
        }
        let Some(expected) = structure_volume(size) else {
            return Err(StructureError::TooLarge {
                id,
                size,
                max: MAX_STRUCTURE_VOLUME,
            });
        };
        if voxels.len() != expected {
            return Err(StructureError::SizeMismatch {
                id,
                expected,
                actual: voxels.len(),
            });
        }
        Ok(Self {
            id,
            kind,
            size,
            voxels,
            placements: Vec::new(),
            weight: 1,
            rotations: RotationSet::all(),
            generators: Vec::new(),
            architecture: None,
        })
    }

    /// Set the spawn weight (0 never spawns from the placement grid).
    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    /// Restrict the rotations the placement grid may choose.
    #[must_use]
    pub const fn with_rotations(mut self, rotations: RotationSet) -> Self {
        self.rotations = rotations;
        self
    }

    /// Register the template for a generator id.
    #[must_use]
    pub fn with_generator(mut self, generator_id: impl Into<String>) -> Self {
        self.generators.push(generator_id.into());
        self
    }

    /// Attach spawner metadata.
    #[must_use]
    pub fn with_architecture(mut self, info: ArchitectureInfo) -> Self {
        self.architecture = Some(info);
        self
    }

    /// Add an entity placement, rejecting ones outside the volume.
    pub fn with_placement(mut self, placement: EntityPlacement) -> Result<Self, StructureError> {
        if !self.contains_local(placement.local) {
            return Err(StructureError::PlacementOutOfBounds {
                id: self.id,
                entity_id: placement.entity_id,
                local: placement.local,
            });
        }
        self.placements.push(placement);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn kind(&self) -> StructureKind {
        self.kind
    }

    pub const fn size(&self) -> UVec3 {
        self.size
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn placements(&self) -> &[EntityPlacement] {
        &self.placements
    }

    pub const fn weight(&self) -> u32 {
        self.weight
    }

    pub const fn rotations(&self) -> RotationSet {
        self.rotations
    }

    pub fn generators(&self) -> &[String] {
        &self.generators
    }

    pub const fn architecture(&self) -> Option<&ArchitectureInfo> {
        self.architecture.as_ref()
    }

    /// Whether the template is registered for a generator id.
    pub fn supports_generator(&self, generator_id: &str) -> bool {
        self.generators.iter().any(|g| g == generator_id)
    }

    /// Whether a local coordinate lies inside the volume.
    pub fn contains_local(&self, p: IVec3) -> bool {
        p.cmpge(IVec3::ZERO).all() && p.cmplt(self.size.as_ivec3()).all()
    }

    #[inline]
    fn index(size: UVec3, p: IVec3) -> usize {
        (p.x as u32 + size.x * (p.y as u32 + size.y * p.z as u32)) as usize
    }

    /// Voxel at a local coordinate, `None` outside the volume.
    pub fn voxel_at(&self, p: IVec3) -> Option<Voxel> {
        self.contains_local(p)
            .then(|| self.voxels[Self::index(self.size, p)])
    }

    /// Iterate `(local, voxel)` for every solid or liquid cell.
    pub fn filled_cells(&self) -> impl Iterator<Item = (IVec3, Voxel)> + '_ {
        let size = self.size;
        self.voxels.iter().enumerate().filter_map(move |(i, v)| {
            if v.is_air() {
                return None;
            }
            let i = i as u32;
            let x = i % size.x;
            let y = (i / size.x) % size.y;
            let z = i / (size.x * size.y);
            Some((UVec3::new(x, y, z).as_ivec3(), *v))
        })
    }

    /// Iterate `(local, voxel)` for the cells that overwrite terrain when
    /// the structure is merged; liquid and Air cells are skipped.
    pub fn solid_cells(&self) -> impl Iterator<Item = (IVec3, Voxel)> + '_ {
        self.filled_cells().filter(|(_, v)| v.is_solid())
    }

    /// Rebuild the template rotated around the vertical axis.
    ///
    /// Extents, voxels, entity placements (position and facing) and the
    /// spawn box are all remapped with the same lattice transform.
    pub fn rotated(&self, rotation: Rotation) -> Self {
        if rotation == Rotation::North {
            return self.clone();
        }

        let size = self.size;
        let out_size = rotation.rotate_size(size);
        let mut voxels = vec![Voxel::AIR; self.voxels.len()];
        for z in 0..size.z as i32 {
            for y in 0..size.y as i32 {
                for x in 0..size.x as i32 {
                    let p = IVec3::new(x, y, z);
                    let q = rotation.rotate_local(p, size);
                    voxels[Self::index(out_size, q)] = self.voxels[Self::index(size, p)];
                }
            }
        }

        let placements = self
            .placements
            .iter()
            .map(|pl| EntityPlacement {
                entity_id: pl.entity_id.clone(),
                local: rotation.rotate_local(pl.local, size),
                facing: rotation.rotate_facing(pl.facing),
            })
            .collect();

        let architecture = self.architecture.as_ref().map(|info| {
            let a = rotation.rotate_local(info.spawn_min, size);
            let b = rotation.rotate_local(info.spawn_max, size);
            ArchitectureInfo {
                spawn_min: a.min(b),
                spawn_max: a.max(b),
                mobs: info.mobs.clone(),
            }
        });

        Self {
            id: self.id.clone(),
            kind: self.kind,
            size: out_size,
            voxels,
            placements,
            weight: self.weight,
            rotations: self.rotations,
            generators: self.generators.clone(),
            architecture,
        }
    }
}
