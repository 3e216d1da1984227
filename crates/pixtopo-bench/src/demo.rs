//! Built-in demonstration grids.

use clap::ValueEnum;
use pixtopo_core::{Dimensions, Grid, Pixel, TopologyError};

/// Built-in grid selection.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Demo {
    /// 8x12 blob used as the classification reference.
    Course,
    /// 40x60 scene: rectangle, small square, diagonal band.
    Shapes,
}

const COURSE: &str = "\
000000000000
000000000000
000001111000
001111111100
000011111000
000111110000
000000000000
000000000000";

impl Demo {
    /// Build the selected grid.
    pub fn grid(self) -> Result<Grid, TopologyError> {
        match self {
            Self::Course => COURSE.parse(),
            Self::Shapes => Ok(shapes()),
        }
    }
}

/// 40x60 grid with a 20x30 rectangle, a 5x5 square in the top-left area
/// and a diagonal band crossing the rectangle's lower edge.
fn shapes() -> Grid {
    Grid::from_fn(Dimensions::new(40, 60), |p| {
        let (r, c) = (p.row, p.col);
        let rectangle = (10..30).contains(&r) && (15..45).contains(&c);
        let square = (5..10).contains(&r) && (5..10).contains(&c);
        let band = (25..35).contains(&r) && c + 20 >= r && c + 15 < r;
        Pixel::from(rectangle || square || band)
    })
}
