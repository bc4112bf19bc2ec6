//! Radius search over a loaded tract dataset.

use equivalent_area_radius_models::{RadiusData, SearchConfig};
use equivalent_area_spatial::{PopulationEstimate, WorkingDataset, boundary_point, circle};
use geo::{Point, Polygon};

use crate::{PopulationOracle, RadiusError, search};

/// Measures population in circles around a fixed center.
#[derive(Debug)]
pub struct CircleAggregator<'a> {
    dataset: &'a WorkingDataset,
    center: Point<f64>,
    segments: usize,
}

impl<'a> CircleAggregator<'a> {
    /// Creates an aggregator for circles of `segments` vertices around
    /// `center`.
    #[must_use]
    pub const fn new(dataset: &'a WorkingDataset, center: Point<f64>, segments: usize) -> Self {
        Self {
            dataset,
            center,
            segments,
        }
    }

    /// The candidate region for `radius`.
    #[must_use]
    pub fn region(&self, radius: f64) -> Polygon<f64> {
        circle(self.center, radius, self.segments)
    }

    /// Full estimate (clipped tracts included) for `radius`.
    #[must_use]
    pub fn estimate(&self, radius: f64) -> PopulationEstimate {
        self.dataset.estimate_population(&self.region(radius))
    }
}

impl PopulationOracle for CircleAggregator<'_> {
    fn population_at(&self, radius: f64) -> u64 {
        self.estimate(radius).total_population
    }

    fn is_saturated(&self, radius: f64) -> bool {
        self.dataset.is_enclosed_by(&self.region(radius))
    }
}

/// A converged radius and how to redraw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusOutcome {
    /// Final radius, in input coordinate units.
    pub radius: f64,
    /// Rounded population inside the final circle.
    pub population: u64,
    /// Population evaluations spent bracketing.
    pub bracket_iterations: usize,
    /// Population evaluations spent refining.
    pub refine_iterations: usize,
    /// Query point and a point on the final circle.
    pub data: RadiusData,
}

/// Finds a radius around `point` whose circle holds a population within
/// the configured tolerance of `target`.
///
/// # Errors
///
/// Returns [`RadiusError`] if the configuration is invalid, the dataset
/// cannot supply the target, or refinement does not converge.
pub fn find_radius(
    point: Point<f64>,
    dataset: &WorkingDataset,
    target: u64,
    config: &SearchConfig,
) -> Result<RadiusOutcome, RadiusError> {
    let aggregator = CircleAggregator::new(dataset, point, config.circle_segments);
    let outcome = search(&aggregator, target, config)?;

    let radius = outcome.state.radius;
    let area = aggregator.region(radius);
    let outer = boundary_point(&area).unwrap_or(point);

    Ok(RadiusOutcome {
        radius,
        population: outcome.state.population,
        bracket_iterations: outcome.bracket_iterations,
        refine_iterations: outcome.refine_iterations,
        data: RadiusData {
            inner_point: point.x_y(),
            outer_point: outer.x_y(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use equivalent_area_tiles_models::Tract;
    use geo::{MultiPolygon, Rect, coord};

    fn unit_tract(population: f64) -> Tract {
        let rect = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        Tract {
            tract_id: "t".to_string(),
            geometry: MultiPolygon(vec![rect.to_polygon()]),
            population,
        }
    }

    #[test]
    fn converges_to_half_of_single_tract() {
        let dataset = WorkingDataset::new(vec![unit_tract(1_000.0)]);
        let point = Point::new(0.5, 0.5);

        let outcome = find_radius(point, &dataset, 500, &SearchConfig::default()).unwrap();

        assert!(
            (450..=550).contains(&outcome.population),
            "population {} outside band",
            outcome.population
        );
        // The circle stays inside the tract, so its area is population / density.
        #[allow(clippy::cast_precision_loss)]
        let expected = (outcome.population as f64 / 1_000.0 / std::f64::consts::PI).sqrt();
        assert!((outcome.radius - expected).abs() / expected < 0.01);

        let estimate = CircleAggregator::new(&dataset, point, 64).estimate(outcome.radius);
        assert_eq!(estimate.total_population, outcome.population);
    }

    #[test]
    fn result_points_describe_the_circle() {
        let dataset = WorkingDataset::new(vec![unit_tract(1_000.0)]);
        let point = Point::new(0.5, 0.5);

        let outcome = find_radius(point, &dataset, 500, &SearchConfig::default()).unwrap();

        assert_eq!(outcome.data.inner_point, (0.5, 0.5));
        let (x, y) = outcome.data.outer_point;
        assert!((x - (0.5 + outcome.radius)).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_target_keeps_seed_radius() {
        let dataset = WorkingDataset::new(vec![unit_tract(1_000.0)]);
        let config = SearchConfig::default();

        let outcome = find_radius(Point::new(0.5, 0.5), &dataset, 0, &config).unwrap();

        assert!((outcome.radius - config.seed_radius).abs() < f64::EPSILON);
        assert_eq!(outcome.population, 0);
    }

    #[test]
    fn exhausted_dataset_reports_insufficient_coverage() {
        let dataset = WorkingDataset::new(vec![unit_tract(1_000.0)]);

        match find_radius(Point::new(0.5, 0.5), &dataset, 5_000, &SearchConfig::default()) {
            Err(RadiusError::InsufficientCoverage {
                population, target, ..
            }) => {
                assert_eq!(population, 1_000);
                assert_eq!(target, 5_000);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_is_immediately_insufficient() {
        let dataset = WorkingDataset::new(vec![]);

        assert!(matches!(
            find_radius(Point::new(0.0, 0.0), &dataset, 1, &SearchConfig::default()),
            Err(RadiusError::InsufficientCoverage { iterations: 1, .. })
        ));
    }
}
