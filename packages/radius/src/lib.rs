#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Adaptive radius search.
//!
//! Finds a radius around a point whose circle holds a population within a
//! tolerance band of a target. The search runs in two phases:
//!
//! 1. **Bracketing** grows the radius geometrically from a small seed until
//!    the population first reaches the target.
//! 2. **Refinement** steps the radius up or down by a relative fraction,
//!    halving the fraction every time the direction reverses, until the
//!    population lands inside the band.
//!
//! Both phases are bounded: bracketing fails with
//! [`RadiusError::InsufficientCoverage`] when the loaded tracts cannot
//! supply the target, and refinement fails with
//! [`RadiusError::RadiusSearchDidNotConverge`] when it exhausts its
//! iteration or step-size budget.

pub mod aggregator;
pub mod search;

use thiserror::Error;

pub use aggregator::{CircleAggregator, RadiusOutcome, find_radius};
pub use search::{SearchOutcome, Step, bracket, refine, refine_step, search, validate_config};

/// Population inside a circle of a given radius around a fixed point.
///
/// Implemented over tract data by [`CircleAggregator`]; tests substitute
/// scripted sequences.
pub trait PopulationOracle {
    /// Rounded population inside the circle of `radius`.
    fn population_at(&self, radius: f64) -> u64;

    /// Whether the circle of `radius` already covers every available tract,
    /// so that growing it further cannot add population.
    fn is_saturated(&self, _radius: f64) -> bool {
        false
    }
}

/// Errors that abort a radius search.
#[derive(Debug, Error)]
pub enum RadiusError {
    /// The loaded tracts cannot supply the target population.
    #[error(
        "Population plateaued at {population} (radius {radius}) after {iterations} \
         bracketing steps, target is {target}"
    )]
    InsufficientCoverage {
        /// Last radius tried.
        radius: f64,
        /// Population at that radius.
        population: u64,
        /// Requested population.
        target: u64,
        /// Bracketing evaluations performed.
        iterations: usize,
    },

    /// Refinement ran out of budget before entering the tolerance band.
    #[error(
        "Radius search did not converge after {iterations} steps: best radius {radius} \
         holds {population} people, target is {target} (step fraction {step_fraction})"
    )]
    RadiusSearchDidNotConverge {
        /// Radius whose population was closest to the target.
        radius: f64,
        /// Population at that radius.
        population: u64,
        /// Requested population.
        target: u64,
        /// Refinement evaluations performed.
        iterations: usize,
        /// Step fraction when the search stopped.
        step_fraction: f64,
    },

    /// The search configuration is unusable.
    #[error("Invalid search configuration: {message}")]
    InvalidConfig {
        /// What is wrong with it.
        message: String,
    },
}
