//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::metrics::QualityMetric;
use crate::types::MAX_COLORS;
use serde::{Deserialize, Serialize};

/// Parameters for one clustering run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of grid rows
    pub height: u32,
    /// Number of grid columns
    pub width: u32,
    /// Number of object colors (K)
    pub num_colors: u32,
    /// Fraction of cells seeded with an object (0.0 to 1.0)
    pub fill_fraction: f64,
    /// Number of ants
    pub num_ants: u32,
    /// Number of ticks to run (T)
    pub num_steps: u64,
    /// Pick threshold; smaller values make ants pick up more eagerly
    pub k1: f64,
    /// Drop threshold; smaller values make ants drop more eagerly
    pub k2: f64,
    /// Ticks between quality samples
    pub track_interval: u64,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Quality score recorded in the history
    pub metric: QualityMetric,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            height: 20,
            width: 20,
            num_colors: 2,
            fill_fraction: 0.3,
            num_ants: 50,
            num_steps: 10_000,
            k1: 0.3,
            k2: 0.15,
            track_interval: 100,
            seed: 0,
            metric: QualityMetric::default(),
        }
    }
}

impl SimulationConfig {
    /// Set the fill from a percentage in `[0, 100]`
    pub fn with_fill_percentage(mut self, percentage: f64) -> Self {
        self.fill_fraction = percentage / 100.0;
        self
    }

    /// Number of objects the initial grid will hold
    pub fn object_count(&self) -> usize {
        object_count(self.height, self.width, self.fill_fraction)
    }

    /// Reject configurations the simulation cannot run.
    pub fn validate(&self) -> Result<()> {
        validate_grid(self.height, self.width, self.num_colors, self.fill_fraction)?;

        if self.num_ants == 0 {
            return Err(Error::InvalidConfig("num_ants must be positive".to_string()));
        }
        if !(self.k1.is_finite() && self.k1 > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "k1 must be a positive number, got {}",
                self.k1
            )));
        }
        if !(self.k2.is_finite() && self.k2 > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "k2 must be a positive number, got {}",
                self.k2
            )));
        }
        if self.track_interval == 0 {
            return Err(Error::InvalidConfig(
                "track_interval must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Check the parameters a grid is built from.
pub fn validate_grid(height: u32, width: u32, num_colors: u32, fill_fraction: f64) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(Error::InvalidConfig(format!(
            "grid dimensions must be positive, got {}x{}",
            height, width
        )));
    }
    if height as u64 * width as u64 > i32::MAX as u64 {
        return Err(Error::InvalidConfig(format!(
            "grid of {}x{} cells is too large",
            height, width
        )));
    }
    if num_colors == 0 || num_colors > MAX_COLORS {
        return Err(Error::InvalidConfig(format!(
            "num_colors must be between 1 and {}, got {}",
            MAX_COLORS, num_colors
        )));
    }
    if !(0.0..=1.0).contains(&fill_fraction) {
        return Err(Error::InvalidConfig(format!(
            "fill_fraction must be within [0, 1], got {}",
            fill_fraction
        )));
    }
    Ok(())
}

/// `round(height * width * fill_fraction)`, capped at the cell count
pub fn object_count(height: u32, width: u32, fill_fraction: f64) -> usize {
    let cells = height as usize * width as usize;
    ((cells as f64 * fill_fraction).round() as usize).min(cells)
}
