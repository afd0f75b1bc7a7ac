//! Dense chunk voxel storage for the Voxterra engine.

pub mod chunk;

pub use chunk::{Chunk, ChunkDiff, EntityRecord, GeometryHandle};
