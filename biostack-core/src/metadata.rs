//! Per-frame and file-level acquisition metadata.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Metadata recorded for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameMetadata {
    /// Acquisition time (s).
    pub time: f64,
    /// Acoustic power (%).
    pub acoustic_power: f64,
}

impl FrameMetadata {
    /// Creates a new frame metadata record.
    #[must_use]
    pub fn new(time: f64, acoustic_power: f64) -> Self {
        Self {
            time,
            acoustic_power,
        }
    }
}

/// File-level acquisition attributes.
///
/// `None` means the attribute was never stored, which is distinct from a
/// stored zero or empty string.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlobalMetadata {
    /// Pixel size (µm/pixel).
    pub resolution: Option<f64>,
    /// Original raw filename.
    pub original_file: Option<String>,
    /// Chamber position label.
    pub position: Option<String>,
}

impl GlobalMetadata {
    /// Set the pixel size.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Set the original raw filename.
    #[must_use]
    pub fn with_original_file(mut self, original_file: impl Into<String>) -> Self {
        self.original_file = Some(original_file.into());
        self
    }

    /// Set the chamber position label.
    #[must_use]
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    /// Returns true if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolution.is_none() && self.original_file.is_none() && self.position.is_none()
    }
}
