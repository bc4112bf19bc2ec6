#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tile reference map and quadrant expansion.
//!
//! The covered territory is pre-partitioned into tiles, each with a
//! population total, an adjacency list and a tract dataset on disk. Before
//! a radius search can run, the tiles around the query point are expanded
//! ring by ring until their population covers the target, and the tract
//! datasets of those tiles (plus one extra ring of neighbors) are merged
//! into a single [`WorkingDataset`](equivalent_area_spatial::WorkingDataset).

pub mod index;
pub mod quadrant;
pub mod source;

use equivalent_area_spatial::SpatialError;
use equivalent_area_tiles_models::TileId;
use thiserror::Error;

pub use index::{ReferenceMap, TileIndex};
pub use quadrant::{
    QuadrantConfig, QuadrantSelection, load_tiles_for, load_working_dataset, select_quadrants,
};
pub use source::{GeoJsonTractSource, TractSource};

/// Errors that can occur while selecting and loading tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// The point is not inside any tile.
    #[error("Point ({lon}, {lat}) is outside the covered territory")]
    OutOfCoverage {
        /// Longitude of the query point.
        lon: f64,
        /// Latitude of the query point.
        lat: f64,
    },

    /// More than one tile claims the point; the partition is corrupt.
    #[error(
        "Point ({lon}, {lat}) falls in {count} tiles ({ids}), expected exactly one",
        count = .matches.len(),
        ids = join_ids(.matches)
    )]
    DataPartitionInvariantViolated {
        /// Longitude of the query point.
        lon: f64,
        /// Latitude of the query point.
        lat: f64,
        /// Every tile that matched.
        matches: Vec<TileId>,
    },

    /// Expansion ran out of tiles (or rings) before reaching the target.
    #[error(
        "Only {population} people reachable after {rings} ring expansions, target is {target}"
    )]
    InsufficientCoverage {
        /// Population of the counted tiles when expansion stopped.
        population: u64,
        /// Requested population.
        target: u64,
        /// Number of ring expansions performed.
        rings: usize,
    },

    /// A selected tile is missing from the reference map.
    #[error("Tile {id} is not in the reference map")]
    TileNotFound {
        /// The missing identifier.
        id: TileId,
    },

    /// Two reference-map records share an identifier.
    #[error("Tile {id} appears more than once in the reference map")]
    DuplicateTile {
        /// The repeated identifier.
        id: TileId,
    },

    /// A tile's tract dataset is missing or unreadable.
    #[error("Dataset for tile {tile} is unavailable: {source}")]
    DatasetUnavailable {
        /// Tile whose dataset failed.
        tile: TileId,
        /// Underlying read/parse failure.
        #[source]
        source: SpatialError,
    },

    /// A reference-map record could not be read.
    #[error("Invalid reference map record {record}: {source}")]
    InvalidRecord {
        /// Index of the offending feature.
        record: usize,
        /// Underlying failure.
        #[source]
        source: SpatialError,
    },

    /// Failure reading the reference map itself.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

fn join_ids(ids: &[TileId]) -> String {
    ids.iter()
        .map(TileId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
