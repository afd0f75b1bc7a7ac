//! Structure templates for the Voxterra engine.
//!
//! A structure is an immutable voxel + entity template that the world
//! generator stamps into terrain at deterministic grid-derived positions.
//! This crate owns the data model, the quarter-turn rotation transform and
//! the registry that generators query by `(generator id, kind)`.

pub mod builtin;
pub mod data;
pub mod registry;
pub mod rotation;
pub mod template;

pub use data::{
    structure_volume, ArchitectureInfo, EntityPlacement, MobEntry, StructureData, StructureError, StructureKind,
    MAX_STRUCTURE_VOLUME,
};
pub use registry::StructureRegistry;
pub use rotation::{Rotation, RotationSet};
