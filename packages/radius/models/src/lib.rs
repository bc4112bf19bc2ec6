#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types shared by the adaptive radius search and its callers.
//!
//! The search state is a plain value: each iteration consumes the previous
//! state and produces the next one, so individual steps can be inspected
//! and tested in isolation.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Tuning knobs for the radius search. Radii are in the units of the
/// input coordinates (degrees for geographic data).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// First radius tried by the bracketing phase.
    pub seed_radius: f64,
    /// Multiplier applied to the radius while bracketing.
    pub growth_factor: f64,
    /// Relative half-width of the tolerance band (0.10 = ±10%).
    pub tolerance: f64,
    /// Initial relative step of the refinement phase.
    pub initial_step_fraction: f64,
    /// Refinement fails once the step shrinks below this.
    pub min_step_fraction: f64,
    /// Maximum number of bracketing evaluations.
    pub max_bracket_iterations: usize,
    /// Maximum number of refinement evaluations.
    pub max_refine_iterations: usize,
    /// Number of segments used to approximate each circle.
    pub circle_segments: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed_radius: 0.01,
            growth_factor: 1.5,
            tolerance: 0.10,
            initial_step_fraction: 0.5,
            min_step_fraction: 1e-9,
            max_bracket_iterations: 64,
            max_refine_iterations: 256,
            circle_segments: 64,
        }
    }
}

/// Which phase of the search produced a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Exponential growth until the target is reached.
    Growing,
    /// Damped steps toward the tolerance band.
    Refining,
}

/// Direction of the last radius adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// The radius grew.
    Grow,
    /// The radius shrank.
    Shrink,
}

/// Snapshot of the search after one population evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Current radius.
    pub radius: f64,
    /// Rounded population inside the circle of `radius`.
    pub population: u64,
    /// Phase that produced this state.
    pub phase: Phase,
    /// Direction of the last refinement step.
    pub direction: Direction,
    /// Relative size of the next refinement step, in `(0, 1]`.
    pub step_fraction: f64,
}

/// Acceptable population range around a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl ToleranceBand {
    /// `[target * (1 - tolerance), target * (1 + tolerance)]`.
    #[must_use]
    pub fn around(target: u64, tolerance: f64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let target = target as f64;
        Self {
            min: target * (1.0 - tolerance),
            max: target * (1.0 + tolerance),
        }
    }

    /// Whether `population` lies inside the band.
    #[must_use]
    pub fn contains(&self, population: u64) -> bool {
        self.direction_for(population).is_none()
    }

    /// The adjustment that moves `population` toward the band, or `None`
    /// when it is already inside.
    #[must_use]
    pub fn direction_for(&self, population: u64) -> Option<Direction> {
        #[allow(clippy::cast_precision_loss)]
        let population = population as f64;
        if population > self.max {
            Some(Direction::Shrink)
        } else if population < self.min {
            Some(Direction::Grow)
        } else {
            None
        }
    }
}

/// The converged circle, as returned to callers: the query point and one
/// point on the circle's boundary, both as `(longitude, latitude)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusData {
    /// Center of the circle.
    pub inner_point: (f64, f64),
    /// A point on the circle's boundary.
    pub outer_point: (f64, f64),
}
