//! Query configuration.
//!
//! Loaded from an optional TOML file. Every field has a default, so a file
//! only needs the values it overrides:
//!
//! ```toml
//! [search]
//! tolerance = 0.05
//!
//! [data]
//! case_count = "/srv/equivalent-area/case_count.json"
//! ```

use std::path::Path;

use equivalent_area_radius_models::SearchConfig;
use equivalent_area_tiles::QuadrantConfig;
use serde::{Deserialize, Serialize};

use crate::{DataPaths, QueryError};

/// Everything a query can be tuned with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Radius search tuning.
    pub search: SearchConfig,
    /// Quadrant expansion limits.
    pub quadrants: QuadrantConfig,
    /// Data file locations.
    pub data: DataPaths,
}

impl QueryConfig {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Io`] if the file cannot be read, or
    /// [`QueryError::Config`] if it is not valid.
    pub fn load(path: &Path) -> Result<Self, QueryError> {
        let text = std::fs::read_to_string(path).map_err(|source| QueryError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = toml::de::from_str(&text).map_err(|source| QueryError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded config from {}", path.display());

        Ok(config)
    }
}
