//! Errors raised by world and engine operations.

use thiserror::Error;

/// Lookup failures for ids supplied by configuration, saves or callers.
///
/// Bounds problems never surface here: out-of-range voxel access resolves
/// to Air instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown generator '{0}'")]
    UnknownGenerator(String),

    #[error("unknown structure '{0}'")]
    UnknownStructure(String),

    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("no active dimension")]
    NoActiveDimension,
}

pub type Result<T> = std::result::Result<T, Error>;
