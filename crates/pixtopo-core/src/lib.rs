//! pixtopo-core: Pure binary-grid topology engine (sans-IO).
//!
//! Analyzes binary images through:
//! distance transform -> erosion -> simple-point classification.
//!
//! The distance transform is a multi-source wavefront under the
//! city-block metric. Erosion by a square structuring element is
//! approximated by thresholding those distances. A pixel is simple when
//! its foreground neighbors form one component under the chosen
//! connectivity and its background neighbors form one component under the
//! dual connectivity.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory grids
//! (or image bytes already read by the caller) and returns structured
//! data.

pub mod connectivity;
pub mod diagnostics;
pub mod distance;
pub mod erosion;
pub mod neighborhood;
pub mod raster;
pub mod simple;
pub mod types;

pub use connectivity::Connectivity;
pub use distance::{Distance, DistanceGrid, transform};
pub use erosion::erode;
pub use neighborhood::{BorderPosition, Window, WindowCell, window};
pub use raster::{Grid, Raster, SimpleMask};
pub use simple::{classify, is_simple};
pub use types::{
    Analysis, AnalysisConfig, Dimensions, Pixel, Point, TopologyError, ValidationError,
};

use log::debug;

/// Run every operation on `grid` under one configuration.
///
/// # Steps
///
/// 1. Validate `config`
/// 2. Distance transform
/// 3. Erosion with `config.structuring_size`, reusing the distances
/// 4. Simple-point classification under `config.connectivity`
///
/// # Errors
///
/// Returns [`TopologyError::Validation`] if `config.structuring_size` is
/// zero or even. Nothing is computed in that case.
pub fn analyze(grid: &Grid, config: &AnalysisConfig) -> Result<Analysis, TopologyError> {
    config.validate()?;

    let distances = distance::transform(grid);
    let eroded = erosion::erode_with(grid, &distances, config.structuring_size)?;
    let simple = simple::classify(grid, config.connectivity);

    debug!(
        "analyze: {} grid, size {}, {} connectivity",
        grid.dimensions(),
        config.structuring_size,
        config.connectivity
    );
    Ok(Analysis {
        config: *config,
        distances,
        eroded,
        simple,
    })
}
