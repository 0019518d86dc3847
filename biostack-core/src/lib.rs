//! biostack-core: Core types for HDF5-backed biological image stacks.
//!
//! This crate holds the storage-independent pieces shared by the stack
//! facades: element types, open modes, axis labels, chunk/compression
//! options and the acquisition metadata records.
//!

pub mod axis;
pub mod element;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod mode;

pub use axis::AxisLabel;
pub use element::ElementType;
pub use error::{Error, Result};
pub use layout::{
    check_size_budget, size_mb, Compression, StackOptions, DEFAULT_GZIP_LEVEL,
    DEFAULT_MAX_SIZE_MB,
};
pub use metadata::{FrameMetadata, GlobalMetadata};
pub use mode::OpenMode;

/// Name of the primary array dataset.
pub const DATA_DATASET: &str = "data";
/// Name of the per-frame acquisition time dataset.
pub const TIME_DATASET: &str = "time";
/// Name of the per-frame acoustic power dataset.
pub const ACOUSTIC_POWER_DATASET: &str = "acoustic_power";
/// Root attribute holding the pixel size (µm/pixel).
pub const RESOLUTION_ATTR: &str = "resolution";
/// Root attribute holding the original raw filename.
pub const ORIGINAL_FILE_ATTR: &str = "original_file";
/// Root attribute holding the chamber position label.
pub const POSITION_ATTR: &str = "position";
