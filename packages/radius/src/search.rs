//! The two search phases, independent of how population is measured.

use equivalent_area_radius_models::{Direction, Phase, SearchConfig, SearchState, ToleranceBand};

use crate::{PopulationOracle, RadiusError};

/// Result of a successful search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// Final state; its population lies inside the tolerance band.
    pub state: SearchState,
    /// Population evaluations spent bracketing.
    pub bracket_iterations: usize,
    /// Population evaluations spent refining.
    pub refine_iterations: usize,
}

/// Outcome of a single refinement step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// The population is inside the tolerance band.
    Converged(SearchState),
    /// Another step is needed from this state.
    Continue(SearchState),
}

/// Checks that `config` describes a search that can make progress.
///
/// # Errors
///
/// Returns [`RadiusError::InvalidConfig`] naming the first bad field.
pub fn validate_config(config: &SearchConfig) -> Result<(), RadiusError> {
    let invalid = |message: &str| {
        Err(RadiusError::InvalidConfig {
            message: message.to_string(),
        })
    };

    if !(config.seed_radius.is_finite() && config.seed_radius > 0.0) {
        return invalid("seed_radius must be positive");
    }
    if !(config.growth_factor.is_finite() && config.growth_factor > 1.0) {
        return invalid("growth_factor must be greater than 1");
    }
    if !(0.0..1.0).contains(&config.tolerance) {
        return invalid("tolerance must be in [0, 1)");
    }
    if !(config.initial_step_fraction > 0.0 && config.initial_step_fraction < 1.0) {
        return invalid("initial_step_fraction must be in (0, 1)");
    }
    if !(config.min_step_fraction > 0.0 && config.min_step_fraction < config.initial_step_fraction)
    {
        return invalid("min_step_fraction must be positive and below initial_step_fraction");
    }
    if config.max_bracket_iterations == 0 || config.max_refine_iterations == 0 {
        return invalid("iteration limits must be at least 1");
    }
    Ok(())
}

/// Phase A: grows the radius geometrically from the seed until the
/// population reaches `target`.
///
/// Returns the first state whose population is at least `target`, together
/// with the number of evaluations spent.
///
/// # Errors
///
/// Returns [`RadiusError::InsufficientCoverage`] if the oracle saturates
/// or the iteration budget runs out first.
pub fn bracket<O: PopulationOracle + ?Sized>(
    oracle: &O,
    target: u64,
    config: &SearchConfig,
) -> Result<(SearchState, usize), RadiusError> {
    let mut radius = config.seed_radius;

    for iteration in 1..=config.max_bracket_iterations {
        let population = oracle.population_at(radius);
        log::debug!("bracket #{iteration}: radius {radius:.6} holds {population}");

        if population >= target {
            log::info!("Bracketed target {target} at radius {radius:.6} ({population} people)");
            return Ok((
                SearchState {
                    radius,
                    population,
                    phase: Phase::Growing,
                    direction: Direction::Shrink,
                    step_fraction: config.initial_step_fraction,
                },
                iteration,
            ));
        }

        if oracle.is_saturated(radius) || iteration == config.max_bracket_iterations {
            return Err(RadiusError::InsufficientCoverage {
                radius,
                population,
                target,
                iterations: iteration,
            });
        }

        radius *= config.growth_factor;
    }

    Err(RadiusError::InsufficientCoverage {
        radius,
        population: 0,
        target,
        iterations: 0,
    })
}

/// One refinement iteration.
///
/// If `state` is already inside `band` nothing is evaluated. Otherwise the
/// radius moves toward the band by `step_fraction` and the population is
/// re-measured. When the move reverses the previous direction, the step
/// fraction of the returned state is halved.
pub fn refine_step<O: PopulationOracle + ?Sized>(
    state: SearchState,
    band: &ToleranceBand,
    oracle: &O,
) -> Step {
    let Some(direction) = band.direction_for(state.population) else {
        return Step::Converged(state);
    };

    let radius = match direction {
        Direction::Shrink => state.radius * (1.0 - state.step_fraction),
        Direction::Grow => state.radius * (1.0 + state.step_fraction),
    };
    let population = oracle.population_at(radius);

    let step_fraction = if direction == state.direction {
        state.step_fraction
    } else {
        state.step_fraction / 2.0
    };

    let next = SearchState {
        radius,
        population,
        phase: Phase::Refining,
        direction,
        step_fraction,
    };

    if band.contains(population) {
        Step::Converged(next)
    } else {
        Step::Continue(next)
    }
}

/// Phase B: damped stepping from a bracketed state into the tolerance band.
///
/// Returns the converged state and the number of evaluations spent.
///
/// # Errors
///
/// Returns [`RadiusError::RadiusSearchDidNotConverge`] if the iteration
/// budget runs out or the step fraction falls below
/// [`SearchConfig::min_step_fraction`]. The error carries the state whose
/// population came closest to the target.
pub fn refine<O: PopulationOracle + ?Sized>(
    start: SearchState,
    target: u64,
    config: &SearchConfig,
    oracle: &O,
) -> Result<(SearchState, usize), RadiusError> {
    let band = ToleranceBand::around(target, config.tolerance);
    if band.contains(start.population) {
        log::info!("Bracketed radius {:.6} is already within tolerance", start.radius);
        return Ok((start, 0));
    }

    let mut state = start;
    let mut best = start;

    for iteration in 0..config.max_refine_iterations {
        match refine_step(state, &band, oracle) {
            Step::Converged(done) => {
                log::info!(
                    "Converged at radius {:.6} ({} people, target {target}) after {} steps",
                    done.radius,
                    done.population,
                    iteration + 1
                );
                return Ok((done, iteration + 1));
            }
            Step::Continue(next) => {
                log::debug!(
                    "refine #{}: {} to radius {:.6}, {} people, step {}",
                    iteration + 1,
                    next.direction,
                    next.radius,
                    next.population,
                    next.step_fraction
                );

                if distance(next.population, target) < distance(best.population, target) {
                    best = next;
                }
                state = next;

                if state.step_fraction < config.min_step_fraction {
                    return Err(did_not_converge(&best, &state, target, iteration + 1));
                }
            }
        }
    }

    Err(did_not_converge(
        &best,
        &state,
        target,
        config.max_refine_iterations,
    ))
}

/// Runs both phases against `oracle`.
///
/// # Errors
///
/// Returns [`RadiusError`] if the configuration is invalid or either phase
/// fails.
pub fn search<O: PopulationOracle + ?Sized>(
    oracle: &O,
    target: u64,
    config: &SearchConfig,
) -> Result<SearchOutcome, RadiusError> {
    validate_config(config)?;

    let (bracketed, bracket_iterations) = bracket(oracle, target, config)?;
    let (state, refine_iterations) = refine(bracketed, target, config, oracle)?;

    Ok(SearchOutcome {
        state,
        bracket_iterations,
        refine_iterations,
    })
}

const fn distance(population: u64, target: u64) -> u64 {
    population.abs_diff(target)
}

const fn did_not_converge(
    best: &SearchState,
    last: &SearchState,
    target: u64,
    iterations: usize,
) -> RadiusError {
    RadiusError::RadiusSearchDidNotConverge {
        radius: best.radius,
        population: best.population,
        target,
        iterations,
        step_fraction: last.step_fraction,
    }
}
