//! Simple-point classification under dual connectivity.
//!
//! A pixel is *simple* when flipping it leaves the topology of the image
//! unchanged. Locally that holds iff the foreground pixels of its border
//! ring form one component under the chosen connectivity and the
//! background pixels form one component under the dual connectivity.
//! Checking both labels with the same connectivity gives wrong answers on
//! diagonal configurations, which is why the background test always uses
//! [`Connectivity::dual`].

use log::{debug, trace};

use crate::connectivity::{Connectivity, is_single_component};
use crate::neighborhood::Window;
use crate::raster::{Grid, SimpleMask};
use crate::types::{Pixel, Point};

/// Whether the window's center is a simple point for `connectivity`.
///
/// The background test runs only when the foreground test passes. Only
/// the border ring is inspected; the center's own value does not matter.
#[must_use]
pub fn is_simple(window: &Window, connectivity: Connectivity) -> bool {
    is_single_component(connectivity, window, Pixel::Foreground)
        && is_single_component(connectivity.dual(), window, Pixel::Background)
}

/// Classify every pixel of `grid`.
///
/// Border and corner pixels are handled through off-grid window cells, so
/// every in-bounds point gets a decision. The input grid is only read.
#[must_use = "returns the simple-point mask"]
pub fn classify(grid: &Grid, connectivity: Connectivity) -> SimpleMask {
    let mask = classify_cells(grid, connectivity);
    debug!(
        "classify: {} grid under {connectivity}, {} simple points",
        grid.dimensions(),
        mask.count(|&simple| simple)
    );
    mask
}

fn decide(grid: &Grid, point: Point, connectivity: Connectivity) -> bool {
    let window = Window::around(grid, point);
    let simple = is_simple(&window, connectivity);
    trace!("{point}: simple = {simple}");
    simple
}

#[cfg(not(feature = "parallel"))]
fn classify_cells(grid: &Grid, connectivity: Connectivity) -> SimpleMask {
    SimpleMask::from_fn(grid.dimensions(), |point| decide(grid, point, connectivity))
}

#[cfg(feature = "parallel")]
fn classify_cells(grid: &Grid, connectivity: Connectivity) -> SimpleMask {
    use rayon::prelude::*;

    let cols = grid.cols();
    let cells: Vec<bool> = (0..grid.rows())
        .into_par_iter()
        .flat_map_iter(|row| {
            (0..cols).map(move |col| decide(grid, Point::new(row, col), connectivity))
        })
        .collect();
    SimpleMask::from_row_major(grid.dimensions(), cells)
}
