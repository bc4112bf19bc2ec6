//! Point-in-polygon lookups over a static set of polygons.

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

/// A polygon envelope stored in the R-tree.
struct PolygonEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for PolygonEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Polygons with attached values, indexed for containment queries.
pub struct PolygonIndex<T> {
    items: Vec<(MultiPolygon<f64>, T)>,
    tree: RTree<PolygonEntry>,
}

impl<T> std::fmt::Debug for PolygonIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonIndex")
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl<T> PolygonIndex<T> {
    /// Bulk-loads the index. Empty polygons are kept but never match.
    #[must_use]
    pub fn new(items: Vec<(MultiPolygon<f64>, T)>) -> Self {
        let entries: Vec<PolygonEntry> = items
            .iter()
            .enumerate()
            .filter_map(|(index, (polygon, _))| {
                polygon.bounding_rect().map(|rect| PolygonEntry {
                    index,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        Self {
            items,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Values of every polygon containing `point`, in insertion order.
    #[must_use]
    pub fn containing(&self, point: &Point<f64>) -> Vec<&T> {
        self.containing_entries(point)
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// Like [`Self::containing`], but also yields the matching polygons.
    #[must_use]
    pub fn containing_entries(&self, point: &Point<f64>) -> Vec<(&MultiPolygon<f64>, &T)> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut indices: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_env)
            .map(|entry| entry.index)
            .filter(|&index| self.items[index].0.contains(point))
            .collect();
        indices.sort_unstable();

        indices
            .into_iter()
            .map(|index| {
                let (polygon, value) = &self.items[index];
                (polygon, value)
            })
            .collect()
    }

    /// Number of polygons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
