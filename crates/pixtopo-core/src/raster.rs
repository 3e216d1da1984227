//! Rectangular raster storage shared by every component.
//!
//! [`Raster<T>`] is a row-major table whose shape is validated once, at
//! construction. Every constructor either guarantees
//! `cells.len() == rows * cols` by construction or checks it and returns
//! [`ValidationError::RaggedRows`]. Downstream code can therefore index
//! with any in-bounds [`Point`] without re-checking shape.
//!
//! The three concrete tables of the engine are aliases:
//! [`Grid`] (pixels), [`SimpleMask`] (booleans) and
//! [`DistanceGrid`](crate::distance::DistanceGrid) (distances).

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use image::GrayImage;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{Dimensions, Pixel, Point, TopologyError, ValidationError};

/// A binary image: one [`Pixel`] per cell.
pub type Grid = Raster<Pixel>;

/// One simple-point decision per source pixel.
pub type SimpleMask = Raster<bool>;

/// A rectangular, row-major table of cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Raster<T> {
    dimensions: Dimensions,
    cells: Vec<T>,
}

impl<T> Raster<T> {
    /// Build a raster from explicit rows.
    ///
    /// An empty `rows` vector yields a 0x0 raster.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::RaggedRows`] if any row's length differs
    /// from the first row's.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, TopologyError> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != cols)
        {
            return Err(ValidationError::RaggedRows {
                row,
                expected: cols,
                found,
            }
            .into());
        }

        let dimensions = Dimensions::new(rows.len(), cols);
        let cells = rows.into_iter().flatten().collect();
        Ok(Self { dimensions, cells })
    }

    /// Build a raster by evaluating `f` at every point, row-major.
    #[must_use]
    pub fn from_fn(dimensions: Dimensions, mut f: impl FnMut(Point) -> T) -> Self {
        let cells = points_of(dimensions).map(&mut f).collect();
        Self { dimensions, cells }
    }

    /// Build a raster where every cell holds `value`.
    #[must_use]
    pub fn new_fill(dimensions: Dimensions, value: T) -> Self
    where
        T: Clone,
    {
        Self {
            dimensions,
            cells: vec![value; dimensions.cell_count()],
        }
    }

    /// Wrap cells already laid out row-major for `dimensions`.
    #[cfg(feature = "parallel")]
    pub(crate) fn from_row_major(dimensions: Dimensions, cells: Vec<T>) -> Self {
        debug_assert_eq!(cells.len(), dimensions.cell_count());
        Self { dimensions, cells }
    }

    /// Shape of the raster.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.dimensions.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.dimensions.cols
    }

    /// Returns `true` if the raster has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `point` is a valid coordinate for this raster.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        self.dimensions.contains(point)
    }

    /// The cell at `point`, or `None` when out of bounds.
    #[must_use]
    pub fn get(&self, point: Point) -> Option<&T> {
        self.linear_index(point).map(|i| &self.cells[i])
    }

    /// Mutable access for the component that owns this raster.
    pub(crate) fn get_mut(&mut self, point: Point) -> Option<&mut T> {
        self.linear_index(point).map(move |i| &mut self.cells[i])
    }

    /// One row as a slice, or `None` past the last row.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&[T]> {
        (row < self.rows()).then(|| {
            let start = row * self.cols();
            &self.cells[start..start + self.cols()]
        })
    }

    /// Iterate over the rows as slices, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        let cols = self.cols();
        (0..self.rows()).map(move |r| &self.cells[r * cols..(r + 1) * cols])
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Every valid point, row-major.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<T> {
        points_of(self.dimensions)
    }

    /// Every cell with its point, row-major.
    pub fn enumerate(&self) -> impl Iterator<Item = (Point, &T)> {
        points_of(self.dimensions).zip(self.cells.iter())
    }

    /// Apply `f` to every cell, producing a raster of the same shape.
    #[must_use]
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Raster<U> {
        Raster {
            dimensions: self.dimensions,
            cells: self.cells.iter().map(f).collect(),
        }
    }

    /// Number of cells satisfying `predicate`.
    #[must_use]
    pub fn count(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.cells.iter().filter(|c| predicate(c)).count()
    }

    /// Consume the raster, returning its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<T>> {
        let cols = self.cols();
        if cols == 0 {
            return (0..self.rows()).map(|_| Vec::new()).collect();
        }
        let mut cells = self.cells.into_iter();
        (0..self.dimensions.rows)
            .map(|_| cells.by_ref().take(cols).collect())
            .collect()
    }

    fn linear_index(&self, point: Point) -> Option<usize> {
        self.contains(point)
            .then(|| point.row * self.cols() + point.col)
    }

    /// Render the raster as an 8-bit image: cells where `on` holds become
    /// 255, the rest 0.
    fn to_gray_with(&self, on: impl Fn(&T) -> bool) -> Result<GrayImage, TopologyError> {
        let too_large = || ValidationError::TooLarge {
            rows: self.rows(),
            cols: self.cols(),
        };
        let width = u32::try_from(self.cols()).map_err(|_| too_large())?;
        let height = u32::try_from(self.rows()).map_err(|_| too_large())?;
        let data = self
            .cells
            .iter()
            .map(|c| if on(c) { u8::MAX } else { 0 })
            .collect();
        GrayImage::from_raw(width, height, data).ok_or_else(|| too_large().into())
    }
}

/// Row-major iterator over every point of `dimensions`.
fn points_of(dimensions: Dimensions) -> impl Iterator<Item = Point> {
    (0..dimensions.rows)
        .flat_map(move |row| (0..dimensions.cols).map(move |col| Point::new(row, col)))
}

impl<T> Index<Point> for Raster<T> {
    type Output = T;

    fn index(&self, point: Point) -> &T {
        assert!(
            self.contains(point),
            "point {point} is outside the {} raster",
            self.dimensions
        );
        &self.cells[point.row * self.cols() + point.col]
    }
}

impl Grid {
    /// Build a grid from numeric rows of `0`/`1` values.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidPixelValue`] for the first cell
    /// (row-major) that is neither `0` nor `1`, and
    /// [`ValidationError::RaggedRows`] if rows differ in length.
    pub fn from_values<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self, TopologyError> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.as_ref()
                    .iter()
                    .enumerate()
                    .map(|(c, &value)| {
                        Pixel::try_from(value).map_err(|_| TopologyError::InvalidPixelValue {
                            value: value.to_string(),
                            point: Point::new(r, c),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }

    /// Threshold a grayscale image: luma `>= threshold` becomes foreground.
    #[must_use]
    pub fn from_gray_image(image: &GrayImage, threshold: u8) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let dimensions = Dimensions::new(image.height() as usize, image.width() as usize);
        let cells = image
            .pixels()
            .map(|p| Pixel::from(p.0[0] >= threshold))
            .collect();
        Self { dimensions, cells }
    }

    /// Decode raw image bytes (PNG, JPEG, BMP, WebP), convert to grayscale
    /// and threshold.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EmptyInput`] if `bytes` is empty.
    /// Returns [`TopologyError::ImageDecode`] if the image format is
    /// unrecognized or the data is corrupt.
    pub fn from_image_bytes(bytes: &[u8], threshold: u8) -> Result<Self, TopologyError> {
        if bytes.is_empty() {
            return Err(TopologyError::EmptyInput);
        }
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_gray_image(&img.to_luma8(), threshold))
    }

    /// Render the grid as a grayscale image (foreground = 255).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TooLarge`] if a dimension exceeds
    /// `u32::MAX`.
    pub fn to_gray_image(&self) -> Result<GrayImage, TopologyError> {
        self.to_gray_with(|p| p.is_foreground())
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.count(|p| p.is_foreground())
    }
}

impl SimpleMask {
    /// Render the mask as a grayscale image (simple = 255).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TooLarge`] if a dimension exceeds
    /// `u32::MAX`.
    pub fn to_gray_image(&self) -> Result<GrayImage, TopologyError> {
        self.to_gray_with(|&simple| simple)
    }
}

/// Text form: one row per non-empty line, `0`/`1` cells optionally
/// separated by whitespace or commas, `#` starts a comment line.
impl FromStr for Grid {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows: Vec<Vec<Pixel>> = Vec::new();
        for line in s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
        {
            let r = rows.len();
            let mut row = Vec::new();
            for ch in line.chars().filter(|c| !c.is_whitespace() && *c != ',') {
                let pixel = match ch {
                    '0' => Pixel::Background,
                    '1' => Pixel::Foreground,
                    other => {
                        return Err(TopologyError::InvalidPixelValue {
                            value: other.to_string(),
                            point: Point::new(r, row.len()),
                        });
                    }
                };
                row.push(pixel);
            }
            rows.push(row);
        }
        Self::from_rows(rows)
    }
}

/// Single-cell text rendering used by the [`Display`](fmt::Display) impl
/// of [`Raster`].
pub trait Glyph {
    /// Write this cell's glyph.
    ///
    /// # Errors
    ///
    /// Propagates formatter errors.
    fn fmt_glyph(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl Glyph for Pixel {
    fn fmt_glyph(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl Glyph for bool {
    fn fmt_glyph(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if *self { "1" } else { "0" })
    }
}

impl<T: Glyph> fmt::Display for Raster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.iter_rows().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(" ")?;
                }
                cell.fmt_glyph(f)?;
            }
        }
        Ok(())
    }
}

/// Serialized as an array of row arrays.
impl<T: Serialize> Serialize for Raster<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter_rows())
    }
}

/// Re-validates rectangularity; ragged input is a deserialization error.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Raster<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<T>>::deserialize(deserializer)?;
        Self::from_rows(rows).map_err(serde::de::Error::custom)
    }
}
