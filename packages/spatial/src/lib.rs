#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory spatial engine for area-weighted population estimates.
//!
//! Holds the per-query working set of census tracts behind an R-tree,
//! and answers "how many people live inside this polygon" by clipping
//! every intersecting tract and scaling its population by the fraction
//! of its area that falls inside. Also provides the circle buffering
//! used to build candidate regions and the `GeoJSON` feature helpers used
//! by the file-backed providers.

pub mod circle;
pub mod dataset;
pub mod features;
pub mod lookup;

use std::path::PathBuf;

use thiserror::Error;

pub use circle::{boundary_point, circle};
pub use dataset::{MatchedTract, PopulationEstimate, WorkingDataset, repair};
pub use lookup::PolygonIndex;

/// Errors raised while reading spatial input.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A `GeoJSON` file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A `GeoJSON` document failed to parse.
    #[error("Invalid GeoJSON in {path}: {source}")]
    GeoJson {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: Box<geojson::Error>,
    },

    /// The document is valid `GeoJSON` but not a feature collection.
    #[error("{path} is not a GeoJSON FeatureCollection")]
    NotAFeatureCollection {
        /// File that failed.
        path: PathBuf,
    },

    /// A feature has no geometry.
    #[error("Feature {feature} has no geometry")]
    MissingGeometry {
        /// Identifier (or index) of the offending feature.
        feature: String,
    },

    /// A feature's geometry has the wrong type.
    #[error("Unsupported geometry type {kind}")]
    UnsupportedGeometry {
        /// The geometry type that was found.
        kind: String,
    },

    /// A required feature property is absent.
    #[error("Missing property {key}")]
    MissingProperty {
        /// Property name (first alias tried).
        key: String,
    },

    /// A feature property has the wrong type.
    #[error("Invalid value for property {key}: {value}")]
    InvalidProperty {
        /// Property name.
        key: String,
        /// Offending value, rendered as JSON.
        value: String,
    },
}
