#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tile and census tract record types.
//!
//! Tiles are precomputed, non-overlapping partitions of the covered
//! territory. Each one carries its total population, the identifiers of
//! the tiles it touches and the location of the tract dataset backing it.
//! Tracts are the fine-grained population polygons inside a tile.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

/// Identifier of a tile in the reference map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub String);

impl TileId {
    /// Creates a tile identifier from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TileId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A reference-map tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Unique tile identifier.
    pub id: TileId,
    /// Bounding geometry of the tile. Tiles partition the territory.
    pub bounding_geometry: MultiPolygon<f64>,
    /// Total resident population of the tile.
    pub population: u64,
    /// Identifiers of the adjacent tiles.
    pub neighbor_ids: BTreeSet<TileId>,
    /// Location of the tract dataset backing this tile.
    pub data_path: PathBuf,
}

/// A census tract: a polygon with a resident population.
#[derive(Debug, Clone, PartialEq)]
pub struct Tract {
    /// Census identifier of the tract (e.g. `"355030801000001"`).
    pub tract_id: String,
    /// Tract boundary.
    pub geometry: MultiPolygon<f64>,
    /// Resident population.
    pub population: f64,
}

/// Parses a neighbor list in the reference-map format (`"12|13|27"`).
///
/// Whitespace around identifiers is ignored, as are empty segments, so a
/// tile with no neighbors may be stored as an empty string.
#[must_use]
pub fn parse_neighbor_ids(raw: &str) -> BTreeSet<TileId> {
    raw.split('|')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(TileId::from)
        .collect()
}
