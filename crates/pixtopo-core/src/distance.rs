//! Wavefront distance transform under the city-block metric.
//!
//! Every background pixel seeds a FIFO queue at distance 0. Popping a
//! pixel relaxes its four axis-aligned neighbors to `d + 1` when that
//! improves them. With unit edge weights a FIFO queue pops pixels in
//! non-decreasing distance order, so each pixel is settled the first time
//! it is reached and the result is the exact Manhattan distance to the
//! nearest background pixel.

use std::collections::VecDeque;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::raster::{Glyph, Grid, Raster};

/// Distance of a pixel to the nearest background pixel.
///
/// Every finite value orders below [`Distance::Unreachable`], so the
/// relaxation step can compare the two uniformly. Serialized as a number,
/// or `null` for unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum Distance {
    /// City-block distance in pixels.
    Finite(u32),
    /// No background pixel exists in the grid.
    Unreachable,
}

impl Distance {
    /// Distance of a background pixel.
    pub const ZERO: Self = Self::Finite(0);

    /// The finite value, if any.
    #[must_use]
    pub const fn finite(self) -> Option<u32> {
        match self {
            Self::Finite(d) => Some(d),
            Self::Unreachable => None,
        }
    }

    /// Returns `true` for [`Distance::Unreachable`].
    #[must_use]
    pub const fn is_unreachable(self) -> bool {
        matches!(self, Self::Unreachable)
    }

    /// Whether this distance is at least `radius`. Unreachable is at least
    /// every radius.
    #[must_use]
    pub const fn at_least(self, radius: u32) -> bool {
        match self {
            Self::Finite(d) => d >= radius,
            Self::Unreachable => true,
        }
    }

    const fn successor(self) -> Self {
        match self {
            Self::Finite(d) => Self::Finite(d.saturating_add(1)),
            Self::Unreachable => Self::Unreachable,
        }
    }
}

impl From<Option<u32>> for Distance {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Self::Unreachable, Self::Finite)
    }
}

impl From<Distance> for Option<u32> {
    fn from(distance: Distance) -> Self {
        distance.finite()
    }
}

impl Glyph for Distance {
    fn fmt_glyph(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(d) => write!(f, "{d}"),
            Self::Unreachable => f.write_str("-"),
        }
    }
}

/// Per-pixel distances, same shape as the source grid.
pub type DistanceGrid = Raster<Distance>;

/// Up, down, left, right.
const AXIS_NEIGHBORS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Compute the city-block distance from every pixel to the nearest
/// background pixel.
///
/// Background pixels get `Finite(0)`. When the grid has no background
/// pixel at all, every cell is [`Distance::Unreachable`]; callers treat
/// that as a degenerate grid rather than an error.
///
/// Runs in time and space linear in the pixel count. The input grid is
/// only read.
#[must_use = "returns the distance grid"]
pub fn transform(grid: &Grid) -> DistanceGrid {
    let mut distances = DistanceGrid::new_fill(grid.dimensions(), Distance::Unreachable);
    let mut queue = VecDeque::with_capacity(grid.cells().len());

    for (point, pixel) in grid.enumerate() {
        if pixel.is_background()
            && let Some(d) = distances.get_mut(point)
        {
            *d = Distance::ZERO;
            queue.push_back(point);
        }
    }
    let sources = queue.len();
    let mut relaxations = 0usize;

    while let Some(point) = queue.pop_front() {
        let next = distances[point].successor();
        for (dr, dc) in AXIS_NEIGHBORS {
            let Some(neighbor) = point.offset(dr, dc) else {
                continue;
            };
            if let Some(d) = distances.get_mut(neighbor)
                && *d > next
            {
                *d = next;
                queue.push_back(neighbor);
                relaxations += 1;
            }
        }
    }

    debug!(
        "distance transform: {} grid, {sources} sources, {relaxations} relaxations",
        grid.dimensions()
    );
    distances
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::types::{Dimensions, Pixel, Point};

    /// Small deterministic generator so property checks need no extra
    /// crate.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            self.0 >> 33
        }

        fn grid(&mut self, rows: usize, cols: usize, foreground_per_mille: u64) -> Grid {
            Grid::from_fn(Dimensions::new(rows, cols), |_| {
                Pixel::from(self.next() % 1000 < foreground_per_mille)
            })
        }
    }

    fn brute_force(grid: &Grid, p: Point) -> Option<u32> {
        grid.enumerate()
            .filter(|(_, px)| px.is_background())
            .map(|(q, _)| (p.row.abs_diff(q.row) + p.col.abs_diff(q.col)) as u32)
            .min()
    }

    #[test]
    fn framed_square_has_concentric_distances() {
        let grid: Grid = "\
            0000000
            0111110
            0111110
            0111110
            0111110
            0111110
            0000000"
            .parse()
            .unwrap();
        let expected = "\
0 0 0 0 0 0 0
0 1 1 1 1 1 0
0 1 2 2 2 1 0
0 1 2 3 2 1 0
0 1 2 2 2 1 0
0 1 1 1 1 1 0
0 0 0 0 0 0 0";
        assert_eq!(transform(&grid).to_string(), expected);
    }

    #[test]
    fn single_source_gives_row_offsets() {
        let grid: Grid = "1110111".parse().unwrap();
        let d = transform(&grid);
        let values: Vec<Option<u32>> = d.cells().iter().map(|d| d.finite()).collect();
        assert_eq!(
            values,
            vec![Some(3), Some(2), Some(1), Some(0), Some(1), Some(2), Some(3)]
        );
    }

    #[test]
    fn matches_brute_force_on_random_grids() {
        let mut rng = Lcg(0x5eed);
        for case in 0..60 {
            let rows = 1 + (case % 9);
            let cols = 1 + (case * 7 % 11);
            let grid = rng.grid(rows, cols, 700);
            let d = transform(&grid);
            for (p, distance) in d.enumerate() {
                assert_eq!(
                    distance.finite(),
                    brute_force(&grid, p),
                    "case {case}: mismatch at {p} in\n{grid}"
                );
            }
        }
    }

    #[test]
    fn background_pixels_are_zero() {
        let mut rng = Lcg(42);
        let grid = rng.grid(12, 15, 500);
        let d = transform(&grid);
        for (p, pixel) in grid.enumerate() {
            if pixel.is_background() {
                assert_eq!(d[p], Distance::ZERO);
            } else {
                assert!(d[p] > Distance::ZERO);
            }
        }
    }

    #[test]
    fn adjacent_distances_differ_by_at_most_one() {
        let mut rng = Lcg(7);
        for _ in 0..20 {
            let grid = rng.grid(10, 13, 850);
            let d = transform(&grid);
            for (p, here) in d.enumerate() {
                for (dr, dc) in [(0, 1), (1, 0)] {
                    if let Some(there) = p.offset(dr, dc).and_then(|q| d.get(q)) {
                        let (a, b) = (here.finite().unwrap(), there.finite().unwrap());
                        assert!(a.abs_diff(b) <= 1, "{p}: {a} vs {b}");
                    }
                }
            }
        }
    }

    #[test]
    fn agrees_with_imageproc_l1_transform() {
        use imageproc::distance_transform::{Norm, distance_transform};

        let mut rng = Lcg(2024);
        for _ in 0..10 {
            let grid = rng.grid(16, 21, 800);
            if grid.foreground_count() == grid.cells().len() {
                continue;
            }
            // imageproc measures distance to its foreground (> 0), so our
            // background pixels are the lit ones.
            let sources = grid.map(|p| p.is_background()).to_gray_image().unwrap();
            let reference = distance_transform(&sources, Norm::L1);
            let d = transform(&grid);
            for (p, distance) in d.enumerate() {
                #[allow(clippy::cast_possible_truncation)]
                let expected = reference.get_pixel(p.col as u32, p.row as u32).0[0];
                assert_eq!(distance.finite(), Some(u32::from(expected)), "at {p}");
            }
        }
    }

    #[test]
    fn no_background_is_unreachable_everywhere() {
        let grid = Grid::new_fill(Dimensions::new(4, 5), Pixel::Foreground);
        let d = transform(&grid);
        assert_eq!(d.dimensions(), grid.dimensions());
        assert!(d.cells().iter().all(|d| d.is_unreachable()));
    }

    #[test]
    fn all_background_is_zero_everywhere() {
        let grid = Grid::new_fill(Dimensions::new(3, 3), Pixel::Background);
        assert!(transform(&grid).cells().iter().all(|&d| d == Distance::ZERO));
    }

    #[test]
    fn empty_grid_yields_empty_distances() {
        let grid = Grid::from_rows(vec![]).unwrap();
        assert!(transform(&grid).is_empty());
    }

    #[test]
    fn unreachable_orders_above_every_finite_value() {
        assert!(Distance::Finite(u32::MAX) < Distance::Unreachable);
        assert!(Distance::Finite(2) < Distance::Finite(3));
        assert!(Distance::Unreachable.at_least(u32::MAX));
        assert!(Distance::Finite(3).at_least(3));
        assert!(!Distance::Finite(2).at_least(3));
    }

    #[test]
    fn distance_serializes_unreachable_as_null() {
        let row = vec![Distance::Finite(2), Distance::Unreachable];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, "[2,null]");
        let back: Vec<Distance> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn display_marks_unreachable() {
        let grid = Grid::new_fill(Dimensions::new(1, 2), Pixel::Foreground);
        assert_eq!(transform(&grid).to_string(), "- -");
    }
}
