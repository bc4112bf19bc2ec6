//! Tile lookup over the reference map.
//!
//! [`ReferenceMap`] keeps every tile's bounding geometry in a
//! [`PolygonIndex`], so containment queries only test the handful of tiles
//! whose envelope covers the point.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use equivalent_area_spatial::features::{
    feature_multipolygon, property_f64, property_string, property_value, read_features,
};
use equivalent_area_spatial::{PolygonIndex, SpatialError};
use equivalent_area_tiles_models::{Tile, TileId, parse_neighbor_ids};
use geo::Point;
use geojson::Feature;
use serde_json::Value;

use crate::TileError;

/// Query contract for the tile reference map.
pub trait TileIndex {
    /// Every tile whose bounding geometry contains `point`.
    fn tiles_containing(&self, point: &Point<f64>) -> Vec<&Tile>;

    /// Looks a tile up by identifier.
    fn tile_by_id(&self, id: &TileId) -> Option<&Tile>;

    /// Identifiers of the tiles adjacent to `tile`.
    fn neighbors<'a>(&self, tile: &'a Tile) -> &'a BTreeSet<TileId> {
        &tile.neighbor_ids
    }

    /// The single tile containing `point`.
    ///
    /// # Errors
    ///
    /// * [`TileError::OutOfCoverage`] if no tile contains the point.
    /// * [`TileError::DataPartitionInvariantViolated`] if several do.
    fn containing_tile(&self, point: &Point<f64>) -> Result<&Tile, TileError> {
        let mut matches = self.tiles_containing(point);
        match matches.len() {
            0 => Err(TileError::OutOfCoverage {
                lon: point.x(),
                lat: point.y(),
            }),
            1 => Ok(matches.remove(0)),
            _ => {
                let mut ids: Vec<TileId> = matches.iter().map(|t| t.id.clone()).collect();
                ids.sort();
                Err(TileError::DataPartitionInvariantViolated {
                    lon: point.x(),
                    lat: point.y(),
                    matches: ids,
                })
            }
        }
    }
}

/// In-memory reference map of tiles.
pub struct ReferenceMap {
    tiles: Vec<Tile>,
    by_id: BTreeMap<TileId, usize>,
    index: PolygonIndex<usize>,
}

impl std::fmt::Debug for ReferenceMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceMap")
            .field("tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}

impl ReferenceMap {
    /// Builds a reference map from tiles.
    ///
    /// Adjacency entries naming unknown tiles are logged and ignored during
    /// expansion.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::DuplicateTile`] if two tiles share an id.
    pub fn new(tiles: Vec<Tile>) -> Result<Self, TileError> {
        let mut by_id = BTreeMap::new();
        for (index, tile) in tiles.iter().enumerate() {
            if by_id.insert(tile.id.clone(), index).is_some() {
                return Err(TileError::DuplicateTile {
                    id: tile.id.clone(),
                });
            }
        }

        for tile in &tiles {
            for neighbor in &tile.neighbor_ids {
                if !by_id.contains_key(neighbor) {
                    log::warn!("Tile {} lists unknown neighbor {neighbor}", tile.id);
                }
            }
        }

        let index = PolygonIndex::new(
            tiles
                .iter()
                .enumerate()
                .map(|(index, tile)| (tile.bounding_geometry.clone(), index))
                .collect(),
        );

        Ok(Self {
            tiles,
            by_id,
            index,
        })
    }

    /// Loads the reference map from a `GeoJSON` feature collection.
    ///
    /// Each feature is one tile with properties `id` (or `id_no`),
    /// `population` (or `total_population`), `neighbors` (a `|`-separated
    /// string or an array) and `path` (or `fpath`). Relative dataset paths
    /// are resolved against the directory of the index file.
    ///
    /// # Errors
    ///
    /// Returns [`TileError`] if the file cannot be read or any record is
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, TileError> {
        let features = read_features(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let tiles = features
            .iter()
            .enumerate()
            .map(|(record, feature)| {
                parse_tile(feature, base_dir)
                    .map_err(|source| TileError::InvalidRecord { record, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("Loaded {} tiles from {}", tiles.len(), path.display());

        Self::new(tiles)
    }

    /// Number of tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map holds no tiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileIndex for ReferenceMap {
    fn tiles_containing(&self, point: &Point<f64>) -> Vec<&Tile> {
        self.index
            .containing(point)
            .into_iter()
            .map(|&index| &self.tiles[index])
            .collect()
    }

    fn tile_by_id(&self, id: &TileId) -> Option<&Tile> {
        self.by_id.get(id).map(|&index| &self.tiles[index])
    }
}

fn parse_tile(feature: &Feature, base_dir: &Path) -> Result<Tile, SpatialError> {
    let id = TileId::new(property_string(feature, &["id", "id_no"])?);
    let bounding_geometry = feature_multipolygon(feature, id.as_str())?;

    let population = property_f64(feature, &["population", "total_population"])?.unwrap_or(0.0);
    if !(population.is_finite() && population >= 0.0) {
        return Err(SpatialError::InvalidProperty {
            key: "population".to_string(),
            value: population.to_string(),
        });
    }

    let neighbor_ids = match property_value(feature, &["neighbors"]) {
        None | Some(Value::Null) => BTreeSet::new(),
        Some(Value::String(raw)) => parse_neighbor_ids(raw),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(TileId::new(s.trim())),
                Value::Number(n) => Ok(TileId::new(n.to_string())),
                other => Err(SpatialError::InvalidProperty {
                    key: "neighbors".to_string(),
                    value: other.to_string(),
                }),
            })
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(SpatialError::InvalidProperty {
                key: "neighbors".to_string(),
                value: other.to_string(),
            });
        }
    };

    let data_path = PathBuf::from(property_string(feature, &["path", "fpath"])?);
    let data_path = if data_path.is_relative() {
        base_dir.join(data_path)
    } else {
        data_path
    };

    Ok(Tile {
        id,
        bounding_geometry,
        population: round_population(population),
        neighbor_ids,
        data_path,
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_population(population: f64) -> u64 {
    population.round_ties_even() as u64
}
