//! Leaf types shared by every Voxterra crate.
//!
//! Voxels and the block palette live in [`types`], the three coordinate
//! spaces (world, chunk, local) in [`coords`], and chunk culling volumes in
//! [`math`]. [`Error`] covers id lookups that can fail.

pub mod coords;
pub mod error;
pub mod math;
pub mod types;

pub use coords::{ChunkPos, Face, LocalPos, WorldPos};
pub use error::{Error, Result};
pub use math::{Aabb, Frustum};
pub use types::{BlockId, BlockPalette, Facing, Rgba, Voxel, VoxelKind};

pub mod constants {
    /// Chunk edge length in voxels.
    pub const CHUNK_SIZE: usize = 16;
    pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
    pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;
    /// `log2(CHUNK_SIZE)`.
    pub const CHUNK_BITS: u32 = 4;
    pub const CHUNK_SIZE_I32: i32 = CHUNK_SIZE as i32;
}
