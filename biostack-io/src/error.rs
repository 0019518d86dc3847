//! I/O error types.

use biostack_core::OpenMode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Stack I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The file could not be opened with the requested mode.
    #[error("cannot open {} with mode {mode}: {source}", path.display())]
    Access {
        path: PathBuf,
        mode: OpenMode,
        source: hdf5::Error,
    },

    /// Error raised by the HDF5 library.
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Core library error.
    #[error("core error: {0}")]
    Core(#[from] biostack_core::Error),

    /// Array shape error raised while building a selection.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// The stack was used after `close`.
    #[error("stack file {} is closed", path.display())]
    Closed { path: PathBuf },

    /// Auxiliary array length does not match the primary array.
    #[error("{name}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Stored element type has no `ElementType` counterpart.
    #[error("unsupported element type: {0}")]
    UnsupportedType(String),

    /// Invalid file contents.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),
}
