#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipality context for a query point.
//!
//! Answers three questions around the radius search: which municipality
//! the point is in, which municipality no larger than the target is
//! closest, and which two state capitals to show alongside the result.

pub mod capitals;
pub mod neighbor;
pub mod user_city;

use std::path::PathBuf;

use equivalent_area_cities_models::City;
use equivalent_area_spatial::SpatialError;
use equivalent_area_spatial::features::{property_f64, property_string};
use geojson::Feature;
use strum_macros::Display;
use thiserror::Error;

pub use capitals::{CAPITALS_TO_HIGHLIGHT, choose_capitals, load_capitals};
pub use neighbor::{CityCentroids, find_neighboring_city};
pub use user_city::{CityMap, find_user_city, load_city_polygons, user_city_in};

/// Which of the two city lookup layers a containment query ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Layer {
    /// The city quadrant reference map.
    CityQuadrant,
    /// Municipality polygons inside one quadrant.
    City,
}

/// Errors that can occur while resolving municipalities and capitals.
#[derive(Debug, Error)]
pub enum CityError {
    /// No polygon of the layer contains the point.
    #[error("Point ({lon}, {lat}) is not inside any {layer}")]
    NotFound {
        /// Layer that was searched.
        layer: Layer,
        /// Longitude of the query point.
        lon: f64,
        /// Latitude of the query point.
        lat: f64,
    },

    /// Several polygons of the layer contain the point.
    #[error("Point ({lon}, {lat}) falls in {count} {layer} polygons, expected exactly one")]
    Ambiguous {
        /// Layer that was searched.
        layer: Layer,
        /// Longitude of the query point.
        lon: f64,
        /// Latitude of the query point.
        lat: f64,
        /// Number of matches.
        count: usize,
    },

    /// Every municipality is larger than the target.
    #[error("No municipality has a population of at most {target}")]
    NoSmallerCity {
        /// Requested population.
        target: u64,
    },

    /// Too few capitals remain once the user's municipality is excluded.
    #[error("Not enough capitals to highlight: only {available} available")]
    NotEnoughCapitals {
        /// Capitals left to choose from.
        available: usize,
    },

    /// A city layer record could not be read.
    #[error("Invalid record {record} in {path}: {source}")]
    InvalidRecord {
        /// File holding the record.
        path: PathBuf,
        /// Index of the offending feature.
        record: usize,
        /// Underlying failure.
        #[source]
        source: SpatialError,
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

    /// A JSON file failed to parse.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Failure reading a `GeoJSON` layer.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Reads the municipality attributes of a city layer feature.
pub(crate) fn parse_city(feature: &Feature) -> Result<City, SpatialError> {
    let raw_code = property_string(feature, &["code_muni"])?;
    let code_muni = raw_code
        .trim()
        .parse()
        .map_err(|_| SpatialError::InvalidProperty {
            key: "code_muni".to_string(),
            value: raw_code.clone(),
        })?;

    let pop_2019 = property_f64(feature, &["pop_2019"])?.ok_or_else(|| {
        SpatialError::MissingProperty {
            key: "pop_2019".to_string(),
        }
    })?;
    if !(pop_2019.is_finite() && pop_2019 >= 0.0) {
        return Err(SpatialError::InvalidProperty {
            key: "pop_2019".to_string(),
            value: pop_2019.to_string(),
        });
    }

    Ok(City {
        code_muni,
        name_muni: property_string(feature, &["name_muni"])?,
        name_state: property_string(feature, &["name_state"])?,
        pop_2019: round_population(pop_2019),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_population(population: f64) -> u64 {
    population.round_ties_even() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: serde_json::Value) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn city_population_rounds_half_to_even() {
        let city = parse_city(&feature(json!({
            "code_muni": "3550308",
            "name_muni": "São Paulo",
            "name_state": "São Paulo",
            "pop_2019": 12_252_022.5,
        })))
        .unwrap();

        assert_eq!(city.code_muni, 3_550_308);
        assert_eq!(city.pop_2019, 12_252_022);
    }

    #[test]
    fn negative_city_population_is_invalid() {
        assert!(matches!(
            parse_city(&feature(json!({
                "code_muni": 1,
                "name_muni": "Nowhere",
                "name_state": "None",
                "pop_2019": -1,
            }))),
            Err(SpatialError::InvalidProperty { .. })
        ));
    }
}
