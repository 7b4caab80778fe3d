//! Clustering quality scores.
//!
//! Two scores are provided and they are not interchangeable:
//!
//! - [`pairwise_adjacency`] counts same-colored right/down neighbor pairs per
//!   object. It is unbounded in principle (up to 2 per object) and is the
//!   canonical quality score recorded by a simulation.
//! - [`mean_local_similarity`] averages, over objects, the share of *occupied*
//!   neighbors with the same color. It lies in `[0, 1]`.
//!
//! Runs being compared must use the same score.

use crate::types::{Color, EMPTY};
use serde::{Deserialize, Serialize};

/// Read-only access to grid cells, enough to score a layout.
pub trait GridView {
    fn height(&self) -> i32;
    fn width(&self) -> i32;
    /// Cell color, `EMPTY` outside the grid
    fn get(&self, row: i32, col: i32) -> Color;
}

/// Which quality score a simulation records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMetric {
    #[default]
    PairwiseAdjacency,
    MeanLocalSimilarity,
}

impl QualityMetric {
    pub fn score<G: GridView + ?Sized>(&self, grid: &G) -> f64 {
        match self {
            QualityMetric::PairwiseAdjacency => pairwise_adjacency(grid),
            QualityMetric::MeanLocalSimilarity => mean_local_similarity(grid),
        }
    }
}

/// Same-colored right and down neighbors, summed and divided by the object count.
pub fn pairwise_adjacency<G: GridView + ?Sized>(grid: &G) -> f64 {
    let mut matches = 0u64;
    let mut objects = 0u64;

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let color = grid.get(row, col);
            if color == EMPTY {
                continue;
            }
            objects += 1;

            if col + 1 < grid.width() && grid.get(row, col + 1) == color {
                matches += 1;
            }
            if row + 1 < grid.height() && grid.get(row + 1, col) == color {
                matches += 1;
            }
        }
    }

    if objects == 0 {
        return 0.0;
    }
    matches as f64 / objects as f64
}

/// Mean over objects of the fraction of occupied neighbors sharing the color.
///
/// An object with no occupied neighbors contributes 0.
pub fn mean_local_similarity<G: GridView + ?Sized>(grid: &G) -> f64 {
    let mut total = 0.0;
    let mut objects = 0u64;

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let color = grid.get(row, col);
            if color == EMPTY {
                continue;
            }
            objects += 1;

            let mut occupied = 0u32;
            let mut same = 0u32;
            for dr in -1..=1 {
                for dc in -1..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    // out-of-bounds reads come back EMPTY
                    let neighbor = grid.get(row + dr, col + dc);
                    if neighbor != EMPTY {
                        occupied += 1;
                        if neighbor == color {
                            same += 1;
                        }
                    }
                }
            }

            if occupied > 0 {
                total += same as f64 / occupied as f64;
            }
        }
    }

    if objects == 0 {
        return 0.0;
    }
    total / objects as f64
}
