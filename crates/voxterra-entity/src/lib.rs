//! Entity subsystem for the Voxterra engine.
//!
//! Uses hecs as the ECS backend. Chunks and structures hand over
//! [`EntityRecord`]s and [`SpawnerRequest`]s; this crate turns them into
//! live entities and keeps them tied to the chunk they belong to.

mod spawner;
mod world;

use glam::{Quat, Vec3};
pub use hecs::Entity;
use voxterra_core::coords::{ChunkPos, WorldPos};
use voxterra_core::types::Facing;
use voxterra_voxel::EntityRecord;

pub use spawner::AreaSpawner;
pub use world::EntityWorld;

/// Transform component.
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Standing on the bottom center of `pos`, turned toward `facing`.
    pub fn at_voxel(pos: WorldPos, facing: Facing) -> Self {
        let yaw = -f32::from(facing.index()) * std::f32::consts::FRAC_PI_2;
        Self {
            position: pos.to_vec3() + Vec3::new(0.5, 0.0, 0.5),
            rotation: Quat::from_rotation_y(yaw),
            scale: Vec3::ONE,
        }
    }
}

/// Persistent object instantiated from a chunk's entity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentObject {
    pub record: EntityRecord,
}

/// Mob produced by an area spawner.
#[derive(Debug, Clone, PartialEq)]
pub struct Mob {
    pub mob_id: String,
    pub spawner: Entity,
}

/// Chunk an entity lives and dies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(pub ChunkPos);
