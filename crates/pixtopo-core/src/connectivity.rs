//! Connected components on the eight-position border ring of a window.
//!
//! A [`Connectivity`] fixes two things, independently of pixel values:
//!
//! - which border positions are *candidates* for a label: the four edge
//!   positions under [`Connectivity::Four`], all eight under
//!   [`Connectivity::Eight`];
//! - which border positions are *adjacent* during traversal: rook moves
//!   under `Four`, king moves under `Eight`. The center never takes part.
//!
//! Under `Four` a traversal may pass through a corner position holding the
//! label even though corners are not candidates themselves; that is how two
//! edge neighbors connect around the center.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::neighborhood::{BorderPosition, Window};
use crate::types::Pixel;

/// Neighbor relation used for traversal and candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Axis-aligned neighbors only.
    #[default]
    Four,
    /// Axis-aligned and diagonal neighbors.
    Eight,
}

impl Connectivity {
    /// Both connectivities, `Four` first.
    pub const ALL: [Self; 2] = [Self::Four, Self::Eight];

    /// The connectivity that must be used for the opposite label.
    ///
    /// Pairing foreground and background with the same connectivity lets
    /// two digital curves cross without sharing a pixel, so topology
    /// checks always pair a connectivity with its dual.
    #[must_use]
    pub const fn dual(self) -> Self {
        match self {
            Self::Four => Self::Eight,
            Self::Eight => Self::Four,
        }
    }

    /// Candidate border positions, in clockwise order.
    #[must_use]
    pub const fn positions(self) -> &'static [BorderPosition] {
        const FOUR: [BorderPosition; 4] = [
            BorderPosition::Top,
            BorderPosition::Right,
            BorderPosition::Bottom,
            BorderPosition::Left,
        ];
        match self {
            Self::Four => &FOUR,
            Self::Eight => &BorderPosition::CLOCKWISE,
        }
    }

    /// Whether two border positions are neighbors on the ring.
    #[must_use]
    pub const fn adjacent(self, a: BorderPosition, b: BorderPosition) -> bool {
        let (ar, ac) = a.offset();
        let (br, bc) = b.offset();
        let (dr, dc) = (ar.abs_diff(br), ac.abs_diff(bc));
        match self {
            Self::Four => dr + dc == 1,
            Self::Eight => dr <= 1 && dc <= 1 && dr + dc > 0,
        }
    }

    /// Border positions adjacent to `position`, clockwise.
    pub fn ring_neighbors(self, position: BorderPosition) -> impl Iterator<Item = BorderPosition> {
        BorderPosition::CLOCKWISE
            .into_iter()
            .filter(move |&other| self.adjacent(position, other))
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Four => "four",
            Self::Eight => "eight",
        })
    }
}

/// Border positions already reached by one traversal.
#[derive(Debug, Clone, Copy, Default)]
struct Visited([bool; 8]);

impl Visited {
    /// Mark `position`; returns `false` if it was already marked.
    const fn insert(&mut self, position: BorderPosition) -> bool {
        let seen = self.0[position.index()];
        self.0[position.index()] = true;
        !seen
    }

    const fn contains(&self, position: BorderPosition) -> bool {
        self.0[position.index()]
    }
}

/// Valid candidate positions holding `label`, in clockwise order.
#[must_use]
pub fn candidates(connectivity: Connectivity, label: Pixel, window: &Window) -> Vec<BorderPosition> {
    connectivity
        .positions()
        .iter()
        .copied()
        .filter(|&pos| window.cell(pos).matches(label))
        .collect()
}

/// Whether the candidates for `label` form exactly one connected component.
///
/// Returns `false` when there are no candidates. Otherwise walks from the
/// first candidate (clockwise order) with an explicit worklist, moving
/// only between adjacent valid positions holding `label`, and succeeds iff
/// every candidate was reached.
#[must_use]
pub fn is_single_component(connectivity: Connectivity, window: &Window, label: Pixel) -> bool {
    let candidates = candidates(connectivity, label, window);
    let Some(&start) = candidates.first() else {
        return false;
    };
    let visited = reach(connectivity, window, label, start);
    candidates.iter().all(|&pos| visited.contains(pos))
}

/// Number of distinct components among the candidates for `label`.
#[must_use]
pub fn component_count(connectivity: Connectivity, window: &Window, label: Pixel) -> usize {
    let mut seen = Visited::default();
    let mut count = 0;
    for pos in candidates(connectivity, label, window) {
        if seen.contains(pos) {
            continue;
        }
        count += 1;
        let component = reach(connectivity, window, label, pos);
        for other in BorderPosition::CLOCKWISE {
            if component.contains(other) {
                seen.insert(other);
            }
        }
    }
    count
}

/// Every border position reachable from `start` through cells holding
/// `label`. The ring has eight positions, so the worklist never grows past
/// eight entries.
fn reach(connectivity: Connectivity, window: &Window, label: Pixel, start: BorderPosition) -> Visited {
    let mut visited = Visited::default();
    visited.insert(start);
    let mut worklist = Vec::with_capacity(BorderPosition::CLOCKWISE.len());
    worklist.push(start);

    while let Some(pos) = worklist.pop() {
        for next in connectivity.ring_neighbors(pos) {
            if window.cell(next).matches(label) && visited.insert(next) {
                worklist.push(next);
            }
        }
    }
    visited
}
