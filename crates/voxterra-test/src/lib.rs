//! Test fixtures for the Voxterra engine.
//!
//! Provides a void generator, hand-built chunks and mesh inputs, temporary
//! save directories and a quad rasterizer for checking mesh output against
//! the per-voxel face rule.

pub mod fixtures;
pub mod raster;

pub use fixtures::{
    chunk_from_fn, grassland_dimension, input_from_fn, red_cube, test_world, void_dimension, TempSaveDir,
    VoidGenerator,
};
pub use raster::{expected_faces, rasterize, sorted_faces, FaceCell, RasterFace};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Mesh layout error: {0}")]
    MeshLayout(String),
}

pub type Result<T> = std::result::Result<T, TestError>;
