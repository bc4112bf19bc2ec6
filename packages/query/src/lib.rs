#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! End-to-end "equivalent area" query.
//!
//! Given a point and a measure (deaths or cases), reads the current count,
//! grows a circle around the point until it holds that many residents, and
//! adds municipality context: the user's own city, the closest city that
//! would vanish entirely, and two state capitals to compare against.

pub mod config;
pub mod paths;
pub mod query;
pub mod target;

use std::path::PathBuf;

use equivalent_area_cities::CityError;
use equivalent_area_radius::RadiusError;
use equivalent_area_tiles::TileError;
use thiserror::Error;

pub use config::QueryConfig;
pub use paths::{DATA_DIR_ENV, DataPaths, data_root, output_dir};
pub use query::{QueryData, QueryOutput, run_query, run_query_with};
pub use target::{FixedTarget, JsonTargetSource, Measure, TargetSource};

/// Errors that abort a query. No partial answer is ever produced.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query coordinates are not usable.
    #[error("Invalid coordinates: lat {lat}, lon {lon}")]
    InvalidCoordinate {
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lon: f64,
    },

    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`QueryConfig`].
    #[error("Invalid config {path}: {source}")]
    Config {
        /// Config file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// The target count file is not valid JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The target count file has no entry for the measure.
    #[error("{path} has no {measure} count")]
    MissingMeasure {
        /// Requested measure.
        measure: Measure,
        /// Target count file.
        path: PathBuf,
    },

    /// The entry for the measure is not a non-negative number.
    #[error("Invalid {measure} count: {value}")]
    InvalidTarget {
        /// Requested measure.
        measure: Measure,
        /// Offending value, rendered as JSON.
        value: String,
    },

    /// Tile selection or loading failed.
    #[error(transparent)]
    Tile(#[from] TileError),

    /// The radius search failed.
    #[error(transparent)]
    Radius(#[from] RadiusError),

    /// Municipality or capital lookup failed.
    #[error(transparent)]
    City(#[from] CityError),
}
