//! The per-query working set of tracts and the area-weighted aggregator.
//!
//! Tract geometries are repaired once when the dataset is built, and their
//! areas are cached alongside an R-tree of their envelopes. Population
//! estimates then only touch tracts whose envelope overlaps the region.

use equivalent_area_tiles_models::Tract;
use geo::{
    Area, BooleanOps, BoundingRect, Contains, Intersects, MultiPolygon, Point, Polygon, Rect,
    Validation,
};
use rstar::{AABB, RTree, RTreeObject};

/// A tract envelope stored in the R-tree, pointing back into the tract list.
struct TractEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for TractEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A tract clipped to a region, with its share of the population.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedTract {
    /// Census identifier of the source tract.
    pub tract_id: String,
    /// The part of the tract that lies inside the region.
    pub geometry: MultiPolygon<f64>,
    /// Population attributed to the clipped part.
    pub population_in_intersection: f64,
}

/// Result of aggregating population over a region.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationEstimate {
    /// Every tract that intersects the region, clipped to it.
    pub matches: Vec<MatchedTract>,
    /// Unrounded sum of `population_in_intersection`.
    pub raw_total: f64,
    /// `raw_total` rounded to the nearest person.
    pub total_population: u64,
}

/// Working dataset for a single query: tracts plus a spatial index.
pub struct WorkingDataset {
    tracts: Vec<Tract>,
    areas: Vec<f64>,
    index: RTree<TractEntry>,
    envelope: Option<Rect<f64>>,
}

impl std::fmt::Debug for WorkingDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkingDataset")
            .field("tracts", &self.tracts.len())
            .field("envelope", &self.envelope)
            .finish_non_exhaustive()
    }
}

impl WorkingDataset {
    /// Builds the dataset: repairs every tract geometry, caches its area
    /// and bulk-loads the R-tree.
    ///
    /// Tracts with zero area are kept but will never contribute population.
    #[must_use]
    pub fn new(tracts: Vec<Tract>) -> Self {
        let tracts: Vec<Tract> = tracts
            .into_iter()
            .map(|tract| Tract {
                geometry: repair(tract.geometry),
                ..tract
            })
            .collect();

        let areas: Vec<f64> = tracts
            .iter()
            .map(|tract| {
                let area = tract.geometry.unsigned_area();
                if !(area.is_finite() && area > 0.0) {
                    log::warn!(
                        "Tract {} has degenerate geometry, its population will be ignored",
                        tract.tract_id
                    );
                }
                area
            })
            .collect();

        let entries: Vec<TractEntry> = tracts
            .iter()
            .enumerate()
            .filter_map(|(index, tract)| {
                tract.geometry.bounding_rect().map(|rect| TractEntry {
                    index,
                    envelope: rect_to_aabb(rect),
                })
            })
            .collect();

        let envelope = tracts
            .iter()
            .filter_map(|tract| tract.geometry.bounding_rect())
            .reduce(merge_rects);

        log::debug!("Indexed {} tracts", entries.len());

        Self {
            tracts,
            areas,
            index: RTree::bulk_load(entries),
            envelope,
        }
    }

    /// Number of tracts in the dataset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracts.len()
    }

    /// Whether the dataset holds no tracts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracts.is_empty()
    }

    /// The (repaired) tracts, in load order.
    #[must_use]
    pub fn tracts(&self) -> &[Tract] {
        &self.tracts
    }

    /// Bounding rectangle of every tract, or `None` for an empty dataset.
    #[must_use]
    pub const fn envelope(&self) -> Option<Rect<f64>> {
        self.envelope
    }

    /// Whether `region` encloses the whole dataset, after which growing the
    /// region cannot add population.
    ///
    /// Only exact for convex regions such as the search circles.
    #[must_use]
    pub fn is_enclosed_by(&self, region: &Polygon<f64>) -> bool {
        self.envelope().is_none_or(|rect| {
            let min = rect.min();
            let max = rect.max();
            [
                Point::new(min.x, min.y),
                Point::new(max.x, min.y),
                Point::new(max.x, max.y),
                Point::new(min.x, max.y),
            ]
            .iter()
            .all(|corner| region.contains(corner))
        })
    }

    /// Indices of tracts whose envelope intersects the region's envelope,
    /// in ascending order.
    fn candidates(&self, region: &Polygon<f64>) -> Vec<usize> {
        let Some(rect) = region.bounding_rect() else {
            return Vec::new();
        };

        let mut indices: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&rect_to_aabb(rect))
            .map(|entry| entry.index)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Estimates how many people live inside `region`.
    ///
    /// Every tract intersecting the region is clipped to it and contributes
    /// its population scaled by the fraction of its area inside. Population
    /// is assumed uniform within a tract. Degenerate (zero-area) tracts
    /// contribute nothing.
    #[must_use]
    pub fn estimate_population(&self, region: &Polygon<f64>) -> PopulationEstimate {
        let matches: Vec<MatchedTract> = self
            .candidates(region)
            .into_iter()
            .filter(|&index| self.tracts[index].geometry.intersects(region))
            .map(|index| {
                let tract = &self.tracts[index];
                let intersection = tract.geometry.intersection(region);
                let population_in_intersection = area_weighted(
                    tract.population,
                    intersection.unsigned_area(),
                    self.areas[index],
                );

                MatchedTract {
                    tract_id: tract.tract_id.clone(),
                    geometry: intersection,
                    population_in_intersection,
                }
            })
            .collect();

        let raw_total: f64 = matches.iter().map(|m| m.population_in_intersection).sum();

        PopulationEstimate {
            matches,
            raw_total,
            total_population: round_population(raw_total),
        }
    }
}

/// Repairs self-intersecting polygons so that area and clipping are
/// well-defined. Valid geometries are returned untouched.
#[must_use]
pub fn repair(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if geometry.is_valid() {
        geometry
    } else {
        geometry.union(&MultiPolygon::<f64>::new(vec![]))
    }
}

/// `population * intersection_area / tract_area`, with degenerate tracts
/// contributing zero.
fn area_weighted(population: f64, intersection_area: f64, tract_area: f64) -> f64 {
    if tract_area.is_finite() && tract_area > 0.0 {
        population * (intersection_area / tract_area).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_population(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round_ties_even() as u64
    } else {
        0
    }
}

fn rect_to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

fn merge_rects(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        geo::coord! { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
        geo::coord! { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
    )
}
