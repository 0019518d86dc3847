//! Semantic axis labels for stack dimensions.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

static LABELS: [AxisLabel; 4] = AxisLabel::ORDER;

/// Axis label, assigned to array axes in the fixed order z, y, x, t.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AxisLabel {
    Z,
    Y,
    X,
    T,
}

impl AxisLabel {
    /// Labels in axis order.
    pub const ORDER: [AxisLabel; 4] = [AxisLabel::Z, AxisLabel::Y, AxisLabel::X, AxisLabel::T];

    /// Maximum supported rank.
    pub const MAX_RANK: usize = Self::ORDER.len();

    /// Label for axis `axis`.
    ///
    /// # Errors
    /// Returns `UnsupportedRank` if `axis` is beyond the fourth axis.
    pub fn for_axis(axis: usize) -> Result<Self> {
        Self::ORDER
            .get(axis)
            .copied()
            .ok_or_else(|| Error::UnsupportedRank(axis.saturating_add(1)))
    }

    /// Labels for the first `rank` axes.
    ///
    /// # Errors
    /// Returns `UnsupportedRank` if `rank` is zero or larger than four.
    pub fn labels_for_rank(rank: usize) -> Result<&'static [AxisLabel]> {
        if rank == 0 || rank > Self::MAX_RANK {
            return Err(Error::UnsupportedRank(rank));
        }
        Ok(&LABELS[..rank])
    }

    /// Dataset name of the coordinate array.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Z => "z",
            Self::Y => "y",
            Self::X => "x",
            Self::T => "t",
        }
    }

    /// Position of this label in the axis order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Z => 0,
            Self::Y => 1,
            Self::X => 2,
            Self::T => 3,
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AxisLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "z" => Ok(Self::Z),
            "y" => Ok(Self::Y),
            "x" => Ok(Self::X),
            "t" => Ok(Self::T),
            other => Err(Error::UnknownAxisLabel(other.to_string())),
        }
    }
}
