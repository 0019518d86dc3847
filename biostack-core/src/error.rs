//! Error types for biostack-core.

use thiserror::Error;

/// Result type alias for biostack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for biostack operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Array rank outside the supported axis label set.
    #[error("unsupported array rank {0} (supported: 1 to 4 axes)")]
    UnsupportedRank(usize),

    /// Axis index outside the array rank.
    #[error("axis {axis} out of range for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Unknown element type name.
    #[error("unknown element type: {0}")]
    UnknownElementType(String),

    /// Unknown file mode string.
    #[error("unknown file mode: {0}")]
    UnknownMode(String),

    /// Unknown axis label.
    #[error("unknown axis label: {0}")]
    UnknownAxisLabel(String),

    /// Invalid compression specification.
    #[error("invalid compression: {0}")]
    InvalidCompression(String),

    /// Chunk shape does not have the same rank as the array.
    #[error("chunk shape {chunk:?} does not match array rank of {shape:?}")]
    ChunkRankMismatch { chunk: Vec<usize>, shape: Vec<usize> },

    /// Array too large to load into memory.
    #[error("stack too large ({size_mb:.1} MB > {limit_mb:.1} MB), use slicing instead")]
    TooLarge { size_mb: f64, limit_mb: f64 },
}
