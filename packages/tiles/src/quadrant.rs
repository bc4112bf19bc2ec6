//! Quadrant expansion: choosing which tiles to load for a query.
//!
//! Starting from the tile containing the query point, the set of counted
//! tiles grows one adjacency ring at a time until its population reaches
//! the target. A second set, the tiles to load, starts one ring wider and
//! grows in lockstep, so the radius search always has geometry beyond the
//! counted area.

use std::collections::BTreeSet;

use equivalent_area_spatial::WorkingDataset;
use equivalent_area_tiles_models::TileId;
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::{TileError, TileIndex, TractSource};

/// Limits on quadrant expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadrantConfig {
    /// Maximum number of ring expansions before giving up.
    pub max_expansion_rings: usize,
}

impl Default for QuadrantConfig {
    fn default() -> Self {
        Self {
            max_expansion_rings: 256,
        }
    }
}

/// Outcome of quadrant expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadrantSelection {
    /// Tile containing the query point.
    pub start: TileId,
    /// Tiles whose population counts toward the target.
    pub count_set: BTreeSet<TileId>,
    /// Tiles whose datasets must be loaded (`count_set` plus one ring).
    pub load_set: BTreeSet<TileId>,
    /// Population of the tiles in `count_set`.
    pub counted_population: u64,
    /// Number of ring expansions performed.
    pub rings: usize,
}

/// Expands from the tile containing `point` until the counted population
/// reaches `target`.
///
/// # Errors
///
/// * [`TileError::OutOfCoverage`] / [`TileError::DataPartitionInvariantViolated`]
///   if the point does not fall in exactly one tile.
/// * [`TileError::InsufficientCoverage`] if a ring adds no new tile or
///   [`QuadrantConfig::max_expansion_rings`] is reached first.
pub fn select_quadrants<I: TileIndex + ?Sized>(
    index: &I,
    point: &Point<f64>,
    target: u64,
    config: &QuadrantConfig,
) -> Result<QuadrantSelection, TileError> {
    let start = index.containing_tile(point)?;

    let mut count_set = BTreeSet::from([start.id.clone()]);
    let mut load_set = count_set.clone();
    load_set.extend(known(index, index.neighbors(start)));

    let mut counted_population = population_of(index, &count_set);
    let mut rings = 0;

    log::debug!(
        "Starting tile {} holds {counted_population} people (target {target})",
        start.id
    );

    while counted_population < target {
        if rings >= config.max_expansion_rings {
            return Err(TileError::InsufficientCoverage {
                population: counted_population,
                target,
                rings,
            });
        }

        let next_count = expand_ring(index, &count_set);
        if next_count.len() == count_set.len() {
            return Err(TileError::InsufficientCoverage {
                population: counted_population,
                target,
                rings,
            });
        }

        load_set = expand_ring(index, &load_set);
        count_set = next_count;
        counted_population = population_of(index, &count_set);
        rings += 1;

        log::debug!(
            "Ring {rings}: counting {} tiles ({counted_population} people), loading {}",
            count_set.len(),
            load_set.len()
        );
    }

    Ok(QuadrantSelection {
        start: start.id.clone(),
        count_set,
        load_set,
        counted_population,
        rings,
    })
}

/// Loads and merges the datasets of every tile in the selection's load
/// set into one [`WorkingDataset`].
///
/// # Errors
///
/// Returns [`TileError`] if a tile is unknown or its dataset cannot be
/// read. No partial dataset is returned.
pub fn load_working_dataset<I, S>(
    index: &I,
    source: &S,
    selection: &QuadrantSelection,
) -> Result<WorkingDataset, TileError>
where
    I: TileIndex + ?Sized,
    S: TractSource + ?Sized,
{
    let mut tracts = Vec::new();

    for id in &selection.load_set {
        let tile = index
            .tile_by_id(id)
            .ok_or_else(|| TileError::TileNotFound { id: id.clone() })?;
        tracts.extend(source.load_tracts(tile)?);
    }

    log::info!(
        "Loaded {} tracts from {} tiles",
        tracts.len(),
        selection.load_set.len()
    );

    Ok(WorkingDataset::new(tracts))
}

/// Selects the tiles around `point` needed to reach `target` and loads
/// them into a [`WorkingDataset`].
///
/// # Errors
///
/// See [`select_quadrants`] and [`load_working_dataset`].
pub fn load_tiles_for<I, S>(
    index: &I,
    source: &S,
    point: &Point<f64>,
    target: u64,
    config: &QuadrantConfig,
) -> Result<WorkingDataset, TileError>
where
    I: TileIndex + ?Sized,
    S: TractSource + ?Sized,
{
    let selection = select_quadrants(index, point, target, config)?;

    log::info!(
        "Selected {} tiles ({} people) after {} rings around tile {}; loading {}",
        selection.count_set.len(),
        selection.counted_population,
        selection.rings,
        selection.start,
        selection.load_set.len()
    );

    load_working_dataset(index, source, &selection)
}

/// `set` plus every known neighbor of every tile in it.
fn expand_ring<I: TileIndex + ?Sized>(index: &I, set: &BTreeSet<TileId>) -> BTreeSet<TileId> {
    let mut expanded = set.clone();
    for tile in set.iter().filter_map(|id| index.tile_by_id(id)) {
        expanded.extend(known(index, index.neighbors(tile)));
    }
    expanded
}

fn known<'a, I: TileIndex + ?Sized>(
    index: &'a I,
    ids: &'a BTreeSet<TileId>,
) -> impl Iterator<Item = TileId> + 'a {
    ids.iter()
        .filter(|id| index.tile_by_id(id).is_some())
        .cloned()
}

fn population_of<I: TileIndex + ?Sized>(index: &I, set: &BTreeSet<TileId>) -> u64 {
    set.iter()
        .filter_map(|id| index.tile_by_id(id))
        .fold(0, |total, tile| total.saturating_add(tile.population))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReferenceMap;
    use equivalent_area_tiles_models::{Tile, Tract};
    use geo::{MultiPolygon, Rect, coord};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn tile(id: &str, column: f64, population: u64, neighbors: &[&str]) -> Tile {
        let rect = Rect::new(
            coord! { x: column, y: 0.0 },
            coord! { x: column + 1.0, y: 1.0 },
        );
        Tile {
            id: TileId::new(id),
            bounding_geometry: MultiPolygon(vec![rect.to_polygon()]),
            population,
            neighbor_ids: neighbors.iter().copied().map(TileId::from).collect(),
            data_path: PathBuf::from(format!("{id}.geojson")),
        }
    }

    /// A row of tiles `a - b - c - d - e`.
    fn chain() -> ReferenceMap {
        ReferenceMap::new(vec![
            tile("a", 0.0, 100, &["b"]),
            tile("b", 1.0, 50, &["a", "c"]),
            tile("c", 2.0, 10, &["b", "d"]),
            tile("d", 3.0, 5, &["c", "e"]),
            tile("e", 4.0, 1, &["d"]),
        ])
        .unwrap()
    }

    fn ids(set: &BTreeSet<TileId>) -> Vec<&str> {
        set.iter().map(TileId::as_str).collect()
    }

    struct MemorySource(BTreeMap<TileId, Vec<Tract>>);

    impl TractSource for MemorySource {
        fn load_tracts(&self, tile: &Tile) -> Result<Vec<Tract>, TileError> {
            Ok(self.0.get(&tile.id).cloned().unwrap_or_default())
        }
    }

    #[test]
    fn starting_tile_already_covers_target() {
        let selection =
            select_quadrants(&chain(), &Point::new(0.5, 0.5), 80, &QuadrantConfig::default())
                .unwrap();

        assert_eq!(ids(&selection.count_set), vec!["a"]);
        assert_eq!(ids(&selection.load_set), vec!["a", "b"]);
        assert_eq!(selection.rings, 0);
    }

    #[test]
    fn zero_target_needs_no_expansion() {
        let selection =
            select_quadrants(&chain(), &Point::new(2.5, 0.5), 0, &QuadrantConfig::default())
                .unwrap();

        assert_eq!(ids(&selection.count_set), vec!["c"]);
        assert_eq!(ids(&selection.load_set), vec!["b", "c", "d"]);
    }

    #[test]
    fn expands_to_adjacent_tile_with_padding() {
        let selection =
            select_quadrants(&chain(), &Point::new(0.5, 0.5), 120, &QuadrantConfig::default())
                .unwrap();

        assert_eq!(ids(&selection.count_set), vec!["a", "b"]);
        assert_eq!(ids(&selection.load_set), vec!["a", "b", "c"]);
        assert_eq!(selection.counted_population, 150);
        assert_eq!(selection.rings, 1);
    }

    #[test]
    fn load_set_stays_one_ring_ahead() {
        let selection =
            select_quadrants(&chain(), &Point::new(0.5, 0.5), 161, &QuadrantConfig::default())
                .unwrap();

        assert_eq!(ids(&selection.count_set), vec!["a", "b", "c", "d"]);
        assert_eq!(ids(&selection.load_set), vec!["a", "b", "c", "d", "e"]);
        assert_eq!(selection.rings, 3);
        assert!(selection.count_set.is_subset(&selection.load_set));
    }

    #[test]
    fn target_beyond_territory_is_insufficient() {
        match select_quadrants(&chain(), &Point::new(0.5, 0.5), 10_000, &QuadrantConfig::default())
        {
            Err(TileError::InsufficientCoverage {
                population, target, ..
            }) => {
                assert_eq!(population, 166);
                assert_eq!(target, 10_000);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn ring_cap_stops_expansion() {
        let config = QuadrantConfig {
            max_expansion_rings: 1,
        };
        match select_quadrants(&chain(), &Point::new(0.5, 0.5), 161, &config) {
            Err(TileError::InsufficientCoverage { rings, .. }) => assert_eq!(rings, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_neighbors_are_ignored() {
        let map = ReferenceMap::new(vec![
            tile("a", 0.0, 10, &["b", "ghost"]),
            tile("b", 1.0, 10, &["a"]),
        ])
        .unwrap();

        let selection =
            select_quadrants(&map, &Point::new(0.5, 0.5), 20, &QuadrantConfig::default())
                .unwrap();

        assert_eq!(ids(&selection.load_set), vec!["a", "b"]);
    }

    #[test]
    fn point_outside_territory() {
        assert!(matches!(
            select_quadrants(&chain(), &Point::new(-3.0, 0.5), 1, &QuadrantConfig::default()),
            Err(TileError::OutOfCoverage { .. })
        ));
    }

    #[test]
    fn merges_datasets_of_load_set() {
        let tract = |id: &str, column: f64| Tract {
            tract_id: id.to_string(),
            geometry: MultiPolygon(vec![
                Rect::new(
                    coord! { x: column, y: 0.0 },
                    coord! { x: column + 1.0, y: 1.0 },
                )
                .to_polygon(),
            ]),
            population: 1.0,
        };
        let source = MemorySource(BTreeMap::from([
            (TileId::new("a"), vec![tract("a1", 0.0)]),
            (TileId::new("b"), vec![tract("b1", 1.0)]),
            (TileId::new("c"), vec![tract("c1", 2.0)]),
            (TileId::new("d"), vec![tract("d1", 3.0)]),
        ]));

        let dataset = load_tiles_for(
            &chain(),
            &source,
            &Point::new(0.5, 0.5),
            120,
            &QuadrantConfig::default(),
        )
        .unwrap();

        let loaded: Vec<&str> = dataset.tracts().iter().map(|t| t.tract_id.as_str()).collect();
        assert_eq!(loaded, vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn missing_tile_aborts_loading() {
        let selection = QuadrantSelection {
            start: TileId::new("a"),
            count_set: BTreeSet::from([TileId::new("a")]),
            load_set: BTreeSet::from([TileId::new("a"), TileId::new("zz")]),
            counted_population: 100,
            rings: 0,
        };

        assert!(matches!(
            load_working_dataset(&chain(), &MemorySource(BTreeMap::new()), &selection),
            Err(TileError::TileNotFound { .. })
        ));
    }
}
