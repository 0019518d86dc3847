//! biostack-io: HDF5-backed image stacks for large biological datasets.
//!
//! Two facades over one HDF5 file each:
//!
//! - [`ImageStack`]: an N-dimensional (1-4 axes) chunked array with a
//!   coordinate array per axis, labelled z, y, x, t.
//! - [`AfsRicmStack`]: a frames × height × width stack with per-frame
//!   acquisition time and acoustic power, plus file-level attributes.
//!
//! Both open the file eagerly and release it on [`ArrayStack::close`] or
//! when dropped. Slicing, iteration and metadata access read only the
//! requested region.
//!

mod afs_ricm;
pub mod dtype;
mod error;
mod file;
pub mod frames;
mod h5;
mod image_stack;
mod stack;

pub use afs_ricm::AfsRicmStack;
pub use error::{Error, Result};
pub use file::StackFile;
pub use frames::{AxisFrames, RicmFrames};
pub use image_stack::ImageStack;
pub use stack::ArrayStack;

pub use biostack_core::{
    AxisLabel, Compression, ElementType, FrameMetadata, GlobalMetadata, OpenMode, StackOptions,
    DEFAULT_MAX_SIZE_MB,
};
