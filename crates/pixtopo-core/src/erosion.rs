//! Erosion by thresholding the distance transform.
//!
//! A foreground pixel survives erosion by a square structuring element of
//! side `n` when it lies at least `n / 2` steps away from the background.
//! Distances here are city-block distances from
//! [`distance::transform`](crate::distance::transform), so the result
//! approximates erosion by a square kernel; it is not an exact
//! morphological erosion for Euclidean or non-square kernels. Callers
//! needing those must use a different operator.

use log::debug;

use crate::distance::{self, DistanceGrid};
use crate::raster::Grid;
use crate::types::{Pixel, TopologyError, ValidationError};

/// Erode `grid` with a square structuring element of side `structuring_size`.
///
/// With `radius = structuring_size / 2`, an output pixel is foreground iff
/// the source pixel is foreground and its distance to the nearest
/// background pixel is `>= radius`. Background pixels always stay
/// background, so `structuring_size == 1` returns the grid unchanged.
/// A grid without background pixels (all distances unreachable) is
/// returned unchanged for every size.
///
/// Foreground area is non-increasing as `structuring_size` grows.
///
/// # Errors
///
/// Returns [`ValidationError::StructuringSize`] if `structuring_size` is
/// zero or even.
pub fn erode(grid: &Grid, structuring_size: u32) -> Result<Grid, TopologyError> {
    check_structuring_size(structuring_size)?;
    erode_with(grid, &distance::transform(grid), structuring_size)
}

/// Reject zero and even structuring sizes.
pub(crate) const fn check_structuring_size(structuring_size: u32) -> Result<(), ValidationError> {
    if structuring_size == 0 || structuring_size % 2 == 0 {
        return Err(ValidationError::StructuringSize(structuring_size));
    }
    Ok(())
}

/// [`erode`] with a distance grid the caller already computed for `grid`.
pub(crate) fn erode_with(
    grid: &Grid,
    distances: &DistanceGrid,
    structuring_size: u32,
) -> Result<Grid, TopologyError> {
    check_structuring_size(structuring_size)?;
    let radius = structuring_size / 2;

    let eroded = Grid::from_fn(grid.dimensions(), |p| {
        Pixel::from(grid[p].is_foreground() && distances[p].at_least(radius))
    });

    debug!(
        "erode: size {structuring_size} (radius {radius}), foreground {} -> {}",
        grid.foreground_count(),
        eroded.foreground_count()
    );
    Ok(eroded)
}
