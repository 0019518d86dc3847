//! Chunk layout, compression, and memory budget for the primary array.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Gzip level applied when none is given.
pub const DEFAULT_GZIP_LEVEL: u8 = 4;

/// Default ceiling for loading a whole stack into memory.
pub const DEFAULT_MAX_SIZE_MB: f64 = 500.0;

/// Chunk compression filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Compression {
    /// Uncompressed chunks.
    None,
    /// Deflate with the given level (0-9).
    Gzip(u8),
}

impl Default for Compression {
    fn default() -> Self {
        Self::Gzip(DEFAULT_GZIP_LEVEL)
    }
}

impl Compression {
    /// Deflate level, if compression is enabled.
    #[must_use]
    pub const fn level(self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Gzip(level) => Some(level),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Gzip(level) => write!(f, "gzip:{level}"),
        }
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.split_once(':') {
            None if s == "gzip" => Ok(Self::default()),
            None if s == "none" => Ok(Self::None),
            Some(("gzip", level)) => {
                let level: u8 = level
                    .parse()
                    .map_err(|_| Error::InvalidCompression(s.to_string()))?;
                if level > 9 {
                    return Err(Error::InvalidCompression(s.to_string()));
                }
                Ok(Self::Gzip(level))
            }
            _ => Err(Error::InvalidCompression(s.to_string())),
        }
    }
}

/// Storage options for creating a primary array.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StackOptions {
    /// Explicit chunk shape. `None` chunks one leading index at a time.
    pub chunk: Option<Vec<usize>>,
    /// Chunk compression.
    pub compression: Compression,
    /// Enable the byte-shuffle filter ahead of compression.
    pub shuffle: bool,
}

impl Default for StackOptions {
    fn default() -> Self {
        Self {
            chunk: None,
            compression: Compression::default(),
            shuffle: false,
        }
    }
}

impl StackOptions {
    /// Set an explicit chunk shape.
    #[must_use]
    pub fn with_chunk(mut self, chunk: impl Into<Vec<usize>>) -> Self {
        self.chunk = Some(chunk.into());
        self
    }

    /// Set the compression filter.
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Enable or disable the shuffle filter.
    #[must_use]
    pub fn with_shuffle(mut self, enabled: bool) -> Self {
        self.shuffle = enabled;
        self
    }

    /// Chunk shape to use for an array of `shape`.
    ///
    /// Without an explicit chunk, the leading axis is chunked by 1 and the
    /// remaining axes span their full extent, so one leading index maps to
    /// exactly one chunk.
    ///
    /// # Errors
    /// Returns `ChunkRankMismatch` if an explicit chunk has a different rank.
    pub fn resolve_chunk(&self, shape: &[usize]) -> Result<Vec<usize>> {
        match &self.chunk {
            Some(chunk) if chunk.len() != shape.len() => Err(Error::ChunkRankMismatch {
                chunk: chunk.clone(),
                shape: shape.to_vec(),
            }),
            Some(chunk) => Ok(chunk.clone()),
            None => Ok(leading_axis_chunk(shape)),
        }
    }
}

/// Chunk of one leading index and full extent on the other axes.
#[must_use]
pub fn leading_axis_chunk(shape: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .enumerate()
        .map(|(axis, &extent)| if axis == 0 { 1 } else { extent })
        .collect()
}

/// Size in megabytes (1e6 bytes) of an array of `shape`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn size_mb(shape: &[usize], element_size: usize) -> f64 {
    let elements: f64 = shape.iter().map(|&n| n as f64).product();
    elements * element_size as f64 / 1e6
}

/// Checks an array of `shape` against a memory budget.
///
/// # Errors
/// Returns `TooLarge` if the array exceeds `max_size_mb`.
pub fn check_size_budget(shape: &[usize], element_size: usize, max_size_mb: f64) -> Result<f64> {
    let size = size_mb(shape, element_size);
    if size > max_size_mb {
        return Err(Error::TooLarge {
            size_mb: size,
            limit_mb: max_size_mb,
        });
    }
    Ok(size)
}
