//! 3x3 neighborhood extraction.
//!
//! A [`Window`] copies the pixel at every offset `(dr, dc)` in
//! `{-1, 0, 1}²` around a center point. Offsets that fall off the grid
//! become invalid cells: they carry no pixel, never match a label and are
//! never traversed. Validity is a property of the window alone; traversal
//! state lives elsewhere (see [`connectivity`](crate::connectivity)).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::raster::Grid;
use crate::types::{Pixel, Point, TopologyError};

/// One of the eight positions surrounding a window's center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BorderPosition {
    /// Offset `(-1, -1)`.
    TopLeft,
    /// Offset `(-1, 0)`.
    Top,
    /// Offset `(-1, 1)`.
    TopRight,
    /// Offset `(0, 1)`.
    Right,
    /// Offset `(1, 1)`.
    BottomRight,
    /// Offset `(1, 0)`.
    Bottom,
    /// Offset `(1, -1)`.
    BottomLeft,
    /// Offset `(0, -1)`.
    Left,
}

impl BorderPosition {
    /// All eight positions, clockwise from the top-left corner.
    pub const CLOCKWISE: [Self; 8] = [
        Self::TopLeft,
        Self::Top,
        Self::TopRight,
        Self::Right,
        Self::BottomRight,
        Self::Bottom,
        Self::BottomLeft,
        Self::Left,
    ];

    /// `(dr, dc)` offset from the window center.
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::TopLeft => (-1, -1),
            Self::Top => (-1, 0),
            Self::TopRight => (-1, 1),
            Self::Right => (0, 1),
            Self::BottomRight => (1, 1),
            Self::Bottom => (1, 0),
            Self::BottomLeft => (1, -1),
            Self::Left => (0, -1),
        }
    }

    /// Position in [`CLOCKWISE`](Self::CLOCKWISE) order, `0..8`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this is one of the four axis-aligned positions.
    #[must_use]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::Top | Self::Right | Self::Bottom | Self::Left)
    }
}

/// One cell of a [`Window`]: a pixel plus whether it lies on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowCell {
    pixel: Pixel,
    valid: bool,
}

impl WindowCell {
    /// A cell that fell outside the source grid.
    const OUTSIDE: Self = Self {
        pixel: Pixel::Background,
        valid: false,
    };

    const fn inside(pixel: Pixel) -> Self {
        Self { pixel, valid: true }
    }

    /// The pixel, or `None` for an off-grid cell.
    #[must_use]
    pub const fn pixel(self) -> Option<Pixel> {
        if self.valid { Some(self.pixel) } else { None }
    }

    /// Whether the cell lies on the source grid.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.valid
    }

    /// Whether the cell is on the grid and holds `label`. Off-grid cells
    /// match nothing.
    #[must_use]
    pub fn matches(self, label: Pixel) -> bool {
        self.valid && self.pixel == label
    }
}

/// The 3x3 neighborhood of a grid point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    center: Point,
    cells: [[WindowCell; 3]; 3],
}

impl Window {
    /// Copy the neighborhood of `center`. Off-grid offsets become invalid
    /// cells; callers must ensure `center` itself is on the grid.
    pub(crate) fn around(grid: &Grid, center: Point) -> Self {
        let mut cells = [[WindowCell::OUTSIDE; 3]; 3];
        for (slot_row, dr) in (-1..=1).enumerate() {
            for (slot_col, dc) in (-1..=1).enumerate() {
                if let Some(&pixel) = center.offset(dr, dc).and_then(|p| grid.get(p)) {
                    cells[slot_row][slot_col] = WindowCell::inside(pixel);
                }
            }
        }
        Self { center, cells }
    }

    /// The grid point this window is centered on.
    #[must_use]
    pub const fn center_point(&self) -> Point {
        self.center
    }

    /// The center cell (always valid for windows built by [`window`]).
    #[must_use]
    pub const fn center(&self) -> WindowCell {
        self.cells[1][1]
    }

    /// The cell at a border position.
    #[must_use]
    pub fn cell(&self, position: BorderPosition) -> WindowCell {
        let (dr, dc) = position.offset();
        self.at(dr, dc).unwrap_or(WindowCell::OUTSIDE)
    }

    /// The cell at offset `(dr, dc)`, or `None` if the offset is outside
    /// `{-1, 0, 1}²`.
    #[must_use]
    pub fn at(&self, dr: isize, dc: isize) -> Option<WindowCell> {
        Some(self.cells[slot(dr)?][slot(dc)?])
    }

    /// The eight border cells in clockwise order from the top-left.
    pub fn border(&self) -> impl Iterator<Item = (BorderPosition, WindowCell)> + '_ {
        BorderPosition::CLOCKWISE
            .into_iter()
            .map(|pos| (pos, self.cell(pos)))
    }
}

/// Map an offset in `-1..=1` to a row/column slot.
const fn slot(offset: isize) -> Option<usize> {
    match offset {
        -1 => Some(0),
        0 => Some(1),
        1 => Some(2),
        _ => None,
    }
}

/// Three lines of `0`/`1`, with `x` for off-grid cells.
impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.iter().enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(" ")?;
                }
                match cell.pixel() {
                    Some(pixel) => write!(f, "{}", u8::from(pixel))?,
                    None => f.write_str("x")?,
                }
            }
        }
        Ok(())
    }
}

/// Extract the 3x3 window centered on `point`.
///
/// Neighbors that fall outside the grid are the normal invalid-cell case,
/// not an error.
///
/// # Errors
///
/// Returns [`TopologyError::OutOfBounds`] if `point` itself is not on the
/// grid.
pub fn window(grid: &Grid, point: Point) -> Result<Window, TopologyError> {
    if !grid.contains(point) {
        return Err(TopologyError::OutOfBounds {
            point,
            dimensions: grid.dimensions(),
        });
    }
    Ok(Window::around(grid, point))
}
