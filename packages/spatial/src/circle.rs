//! Circular candidate regions.
//!
//! A candidate region is the query point buffered by the current search
//! radius, approximated as a regular polygon.

use std::f64::consts::TAU;

use geo::{Coord, LineString, Point, Polygon};

/// Smallest number of segments accepted for a circle approximation.
const MIN_SEGMENTS: usize = 8;

/// Builds a polygon approximating the circle of `radius` around `center`.
///
/// The exterior ring starts at angle zero, i.e. at `(x + radius, y)`, and
/// runs counter-clockwise. `segments` is clamped to at least 8.
#[must_use]
pub fn circle(center: Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(MIN_SEGMENTS);
    let r = radius.abs();

    #[allow(clippy::cast_precision_loss)]
    let step = TAU / n as f64;

    let mut coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f64;
            Coord {
                x: r.mul_add(angle.cos(), center.x()),
                y: r.mul_add(angle.sin(), center.y()),
            }
        })
        .collect();
    coords.push(coords[0]);

    Polygon::new(LineString::new(coords), vec![])
}

/// Returns a deterministic point on the boundary of `area`: the first
/// vertex of its exterior ring.
#[must_use]
pub fn boundary_point(area: &Polygon<f64>) -> Option<Point<f64>> {
    area.exterior().0.first().copied().map(Point::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    #[test]
    fn approximates_circle_area() {
        let polygon = circle(Point::new(0.0, 0.0), 10.0, 64);
        let expected = std::f64::consts::PI * 100.0;
        let error = (polygon.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01, "circle area error {:.3}%", error * 100.0);
    }

    #[test]
    fn ring_is_closed_with_expected_vertex_count() {
        let polygon = circle(Point::new(5.0, 5.0), 1.0, 32);
        let ring = &polygon.exterior().0;
        assert_eq!(ring.len(), 33);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn clamps_segment_count() {
        let polygon = circle(Point::new(0.0, 0.0), 1.0, 3);
        assert_eq!(polygon.exterior().0.len(), MIN_SEGMENTS + 1);
    }

    #[test]
    fn boundary_point_is_first_vertex() {
        let polygon = circle(Point::new(-46.6, -23.5), 0.25, 64);
        let outer = boundary_point(&polygon).unwrap();
        assert!((outer.x() - -46.35).abs() < 1e-12);
        assert!((outer.y() - -23.5).abs() < 1e-12);
    }
}
