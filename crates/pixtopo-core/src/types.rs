//! Shared types for the pixtopo topology engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connectivity::Connectivity;
use crate::distance::DistanceGrid;
use crate::raster::{Grid, SimpleMask};

/// Label of a single pixel in a binary grid.
///
/// The numeric form is `0` for background and `1` for foreground; no
/// other value is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Pixel {
    /// Non-object pixel (`0`).
    #[default]
    Background,
    /// Object pixel (`1`).
    Foreground,
}

impl Pixel {
    /// Returns `true` for [`Pixel::Foreground`].
    #[must_use]
    pub const fn is_foreground(self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// Returns `true` for [`Pixel::Background`].
    #[must_use]
    pub const fn is_background(self) -> bool {
        matches!(self, Self::Background)
    }

    /// The opposite label.
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Background => Self::Foreground,
            Self::Foreground => Self::Background,
        }
    }
}

impl From<Pixel> for u8 {
    fn from(pixel: Pixel) -> Self {
        match pixel {
            Pixel::Background => 0,
            Pixel::Foreground => 1,
        }
    }
}

impl From<bool> for Pixel {
    fn from(foreground: bool) -> Self {
        if foreground {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}

/// A numeric cell value that is neither `0` nor `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pixel value {0} is neither 0 nor 1")]
pub struct NonBinaryValue(pub u8);

impl TryFrom<u8> for Pixel {
    type Error = NonBinaryValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Background),
            1 => Ok(Self::Foreground),
            other => Err(NonBinaryValue(other)),
        }
    }
}

/// An integer grid coordinate.
///
/// `row` grows downward and `col` grows to the right. A point is valid
/// for a grid iff `row < rows` and `col < cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    /// Row index (from the top edge).
    pub row: usize,
    /// Column index (from the left edge).
    pub col: usize,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offset the point by a signed delta, or `None` if either coordinate
    /// would become negative.
    #[must_use]
    pub const fn offset(self, dr: isize, dc: isize) -> Option<Self> {
        match (self.row.checked_add_signed(dr), self.col.checked_add_signed(dc)) {
            (Some(row), Some(col)) => Some(Self { row, col }),
            _ => None,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Total number of cells (`rows * cols`).
    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.rows * self.cols
    }

    /// Whether `point` lies inside these dimensions.
    #[must_use]
    pub const fn contains(self, point: Point) -> bool {
        point.row < self.rows && point.col < self.cols
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Configuration for a full [`analyze`](crate::analyze) run.
///
/// # Invariants
///
/// `structuring_size` must be a positive odd integer. [`validate`](Self::validate)
/// checks this, and [`analyze`](crate::analyze) calls it before touching
/// the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Connectivity applied to the foreground when classifying simple
    /// points. The background is always checked with the dual.
    pub connectivity: Connectivity,

    /// Side length of the square structuring element used for erosion.
    pub structuring_size: u32,
}

impl AnalysisConfig {
    /// Default foreground connectivity.
    pub const DEFAULT_CONNECTIVITY: Connectivity = Connectivity::Four;

    /// Default structuring-element side length.
    pub const DEFAULT_STRUCTURING_SIZE: u32 = 11;

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::StructuringSize`] (wrapped in
    /// [`TopologyError::Validation`]) if `structuring_size` is zero or even.
    pub fn validate(&self) -> Result<(), TopologyError> {
        crate::erosion::check_structuring_size(self.structuring_size)?;
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            connectivity: Self::DEFAULT_CONNECTIVITY,
            structuring_size: Self::DEFAULT_STRUCTURING_SIZE,
        }
    }
}

/// Result of running every core operation on one grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// The configuration the analysis ran with.
    pub config: AnalysisConfig,
    /// City-block distance of each pixel to the nearest background pixel.
    pub distances: DistanceGrid,
    /// The grid eroded with `config.structuring_size`.
    pub eroded: Grid,
    /// Simple-point decision for each pixel under `config.connectivity`.
    pub simple: SimpleMask,
}

/// Input problems detected before any computation starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A row's length differs from the first row's.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        found: usize,
    },

    /// Structuring size is zero or even.
    #[error("structuring size must be a positive odd integer, got {0}")]
    StructuringSize(u32),

    /// Grid cannot be represented as an image (dimension above `u32::MAX`).
    #[error("grid of {rows}x{cols} cells is too large for an image")]
    TooLarge {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
}

/// Errors surfaced by the topology engine.
///
/// Every variant is raised eagerly at the boundary of the operation that
/// detects it; no operation returns a partial result.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// Grid shape or parameter validation failed.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A cell held something other than background/foreground.
    #[error("invalid pixel value `{value}` at {point}: expected 0 or 1")]
    InvalidPixelValue {
        /// The offending value as written by the caller.
        value: String,
        /// Where it was found.
        point: Point,
    },

    /// A window was requested for a point outside the grid.
    #[error("point {point} is outside the {dimensions} grid")]
    OutOfBounds {
        /// The requested point.
        point: Point,
        /// Dimensions of the grid it was checked against.
        dimensions: Dimensions,
    },

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Pixel tests ---

    #[test]
    fn pixel_numeric_round_trip() {
        assert_eq!(u8::from(Pixel::Background), 0);
        assert_eq!(u8::from(Pixel::Foreground), 1);
        assert_eq!(Pixel::try_from(0).unwrap(), Pixel::Background);
        assert_eq!(Pixel::try_from(1).unwrap(), Pixel::Foreground);
    }

    #[test]
    fn pixel_rejects_non_binary() {
        assert_eq!(Pixel::try_from(2), Err(NonBinaryValue(2)));
        assert_eq!(Pixel::try_from(255), Err(NonBinaryValue(255)));
    }

    #[test]
    fn pixel_inverted() {
        assert_eq!(Pixel::Background.inverted(), Pixel::Foreground);
        assert_eq!(Pixel::Foreground.inverted(), Pixel::Background);
    }

    #[test]
    fn pixel_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Pixel::Foreground).unwrap(), "1");
        let p: Pixel = serde_json::from_str("0").unwrap();
        assert_eq!(p, Pixel::Background);
        assert!(serde_json::from_str::<Pixel>("3").is_err());
    }

    // --- Point tests ---

    #[test]
    fn point_offset_within_range() {
        let p = Point::new(2, 3);
        assert_eq!(p.offset(-1, 1), Some(Point::new(1, 4)));
        assert_eq!(p.offset(0, 0), Some(p));
    }

    #[test]
    fn point_offset_below_zero_is_none() {
        assert_eq!(Point::new(0, 3).offset(-1, 0), None);
        assert_eq!(Point::new(3, 0).offset(0, -1), None);
    }

    #[test]
    fn point_display() {
        assert_eq!(Point::new(4, 7).to_string(), "(4, 7)");
    }

    // --- Dimensions tests ---

    #[test]
    fn dimensions_contains() {
        let d = Dimensions::new(2, 3);
        assert!(d.contains(Point::new(1, 2)));
        assert!(!d.contains(Point::new(2, 0)));
        assert!(!d.contains(Point::new(0, 3)));
        assert_eq!(d.cell_count(), 6);
    }

    #[test]
    fn empty_dimensions_contain_nothing() {
        assert!(!Dimensions::new(0, 0).contains(Point::new(0, 0)));
    }

    // --- AnalysisConfig tests ---

    #[test]
    fn analysis_config_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(config.structuring_size, 11);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn analysis_config_rejects_even_and_zero_sizes() {
        for size in [0, 2, 10] {
            let config = AnalysisConfig {
                structuring_size: size,
                ..AnalysisConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(TopologyError::Validation(ValidationError::StructuringSize(s))) if s == size
            ));
        }
    }

    #[test]
    fn analysis_config_serde_round_trip() {
        let config = AnalysisConfig {
            connectivity: Connectivity::Eight,
            structuring_size: 5,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"connectivity":"eight","structuring_size":5}"#);
        let deserialized: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn analysis_config_missing_fields_use_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"structuring_size":3}"#).unwrap();
        assert_eq!(config.connectivity, AnalysisConfig::DEFAULT_CONNECTIVITY);
        assert_eq!(config.structuring_size, 3);
    }

    // --- TopologyError tests ---

    #[test]
    fn error_ragged_rows_display() {
        let err = TopologyError::from(ValidationError::RaggedRows {
            row: 2,
            expected: 4,
            found: 3,
        });
        assert_eq!(err.to_string(), "invalid input: row 2 has 3 cells, expected 4");
    }

    #[test]
    fn error_invalid_pixel_display() {
        let err = TopologyError::InvalidPixelValue {
            value: "7".to_string(),
            point: Point::new(1, 2),
        };
        assert_eq!(
            err.to_string(),
            "invalid pixel value `7` at (1, 2): expected 0 or 1"
        );
    }

    #[test]
    fn error_out_of_bounds_display() {
        let err = TopologyError::OutOfBounds {
            point: Point::new(5, 0),
            dimensions: Dimensions::new(3, 4),
        };
        assert_eq!(err.to_string(), "point (5, 0) is outside the 3x4 grid");
    }

    #[test]
    fn error_empty_input_display() {
        assert_eq!(
            TopologyError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }
}
