#![allow(clippy::module_name_repetitions)]
//! Canonical locations of the precomputed data files.
//!
//! Every file lives in one output directory, `output/` under the data
//! root. The data root is `$EQUIVALENT_AREA_DATA_DIR` when set, else the
//! current directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable naming the data root.
pub const DATA_DIR_ENV: &str = "EQUIVALENT_AREA_DATA_DIR";

/// Returns the data root directory.
#[must_use]
pub fn data_root() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV).map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Returns the `output/` directory holding the data files.
#[must_use]
pub fn output_dir() -> PathBuf {
    data_root().join("output")
}

/// Paths of every file a query reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Tile reference map.
    pub tract_index: PathBuf,
    /// City quadrant reference map.
    pub city_index: PathBuf,
    /// Municipality centroid points.
    pub city_centroids: PathBuf,
    /// State capital records.
    pub capitals: PathBuf,
    /// Current death and case counts.
    pub case_count: PathBuf,
}

impl DataPaths {
    /// The standard file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            tract_index: dir.join("index_tracts_bboxes.geojson"),
            city_index: dir.join("index_city_bboxes.geojson"),
            city_centroids: dir.join("city_centroids.geojson"),
            capitals: dir.join("capitals_radius.json"),
            case_count: dir.join("case_count.json"),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::in_dir(&output_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_file_names() {
        let paths = DataPaths::in_dir(Path::new("/srv/data"));
        assert_eq!(
            paths.tract_index,
            PathBuf::from("/srv/data/index_tracts_bboxes.geojson")
        );
        assert_eq!(
            paths.city_index,
            PathBuf::from("/srv/data/index_city_bboxes.geojson")
        );
        assert_eq!(
            paths.city_centroids,
            PathBuf::from("/srv/data/city_centroids.geojson")
        );
        assert_eq!(paths.capitals, PathBuf::from("/srv/data/capitals_radius.json"));
        assert_eq!(paths.case_count, PathBuf::from("/srv/data/case_count.json"));
    }

    #[test]
    fn default_lives_under_output() {
        let paths = DataPaths::default();
        assert_eq!(paths.case_count, output_dir().join("case_count.json"));
        assert!(paths.case_count.starts_with(data_root()));
    }
}
