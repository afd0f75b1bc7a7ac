//! Save/load for Voxterra worlds.
//!
//! Only what differs from the procedural baseline is written: per chunk the
//! modified local positions with their voxel values and the entities anchored
//! there. Loading regenerates each saved chunk from the seed and applies the
//! diff on top.
//!
//! A save file is an 8-byte header followed by a JSON or bincode body, which
//! may be lz4-compressed.

mod data;
mod format;
mod manager;

pub use data::{ChunkData, DimensionSaveData, EntitySaveRecord, WorldSaveData, FORMAT_VERSION};
pub use format::{decode, encode, Compression, SaveEncoding, HEADER_LEN, MAGIC};
pub use manager::{SaveConfig, SaveManager, SaveStatus, SAVE_EXTENSION};

use thiserror::Error;

/// Errors produced while writing or reading saves.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("decompression failed: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
    #[error("bad save header: {0}")]
    BadHeader(String),
    #[error("unsupported save version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid save name: {0:?}")]
    InvalidName(String),
    #[error("save not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    World(#[from] voxterra_core::Error),
}

pub type Result<T> = std::result::Result<T, SaveError>;
