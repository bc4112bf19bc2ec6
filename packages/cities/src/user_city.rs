//! Municipality containing the query point.
//!
//! Municipality polygons are split into quadrant files the same way tracts
//! are split into tiles. A [`CityMap`] indexes the quadrant footprints, and
//! only the single quadrant holding the point is read.

use std::path::{Path, PathBuf};

use equivalent_area_cities_models::{City, CityData};
use equivalent_area_spatial::PolygonIndex;
use equivalent_area_spatial::features::{feature_multipolygon, property_string, read_features};
use geo::{Centroid, MultiPolygon, Point};

use crate::{CityError, Layer, parse_city};

/// Reference map of city quadrants.
#[derive(Debug)]
pub struct CityMap {
    quadrants: PolygonIndex<PathBuf>,
}

impl CityMap {
    /// Builds the map from quadrant footprints and their dataset paths.
    #[must_use]
    pub fn new(quadrants: Vec<(MultiPolygon<f64>, PathBuf)>) -> Self {
        Self {
            quadrants: PolygonIndex::new(quadrants),
        }
    }

    /// Loads the quadrant map from a `GeoJSON` feature collection whose
    /// features carry a `path` (or `fpath`) property. Relative paths are
    /// resolved against the directory of the map file.
    ///
    /// # Errors
    ///
    /// Returns [`CityError`] if the file cannot be read or a record is
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, CityError> {
        let features = read_features(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let quadrants = features
            .iter()
            .enumerate()
            .map(|(record, feature)| {
                let label = format!("city quadrant {record}");
                let parsed = feature_multipolygon(feature, &label).and_then(|footprint| {
                    property_string(feature, &["path", "fpath"])
                        .map(|data_path| (footprint, base_dir.join(data_path)))
                });
                parsed.map_err(|source| CityError::InvalidRecord {
                    path: path.to_path_buf(),
                    record,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} city quadrants from {}",
            quadrants.len(),
            path.display()
        );

        Ok(Self::new(quadrants))
    }

    /// Number of quadrants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quadrants.len()
    }

    /// Whether the map holds no quadrants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quadrants.is_empty()
    }

    /// Dataset path of the single quadrant containing `point`.
    ///
    /// # Errors
    ///
    /// Returns [`CityError::NotFound`] or [`CityError::Ambiguous`] unless
    /// exactly one quadrant contains the point.
    pub fn quadrant_path(&self, point: &Point<f64>) -> Result<&Path, CityError> {
        let matches = self.quadrants.containing(point);
        exactly_one(matches, Layer::CityQuadrant, point).map(PathBuf::as_path)
    }
}

/// Reads the municipality polygons of one quadrant.
///
/// # Errors
///
/// Returns [`CityError`] if the file cannot be read or a record is
/// malformed.
pub fn load_city_polygons(path: &Path) -> Result<PolygonIndex<City>, CityError> {
    let features = read_features(path)?;

    let cities = features
        .iter()
        .enumerate()
        .map(|(record, feature)| {
            parse_city(feature)
                .and_then(|city| {
                    let geometry = feature_multipolygon(feature, &city.name_muni)?;
                    Ok((geometry, city))
                })
                .map_err(|source| CityError::InvalidRecord {
                    path: path.to_path_buf(),
                    record,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("Loaded {} municipalities from {}", cities.len(), path.display());

    Ok(PolygonIndex::new(cities))
}

/// The municipality containing `point` among `cities`.
///
/// # Errors
///
/// Returns [`CityError::NotFound`] or [`CityError::Ambiguous`] unless
/// exactly one municipality contains the point.
pub fn user_city_in(
    cities: &PolygonIndex<City>,
    point: &Point<f64>,
    target: u64,
) -> Result<CityData, CityError> {
    let (geometry, city) = exactly_one(cities.containing_entries(point), Layer::City, point)?;

    let centroid = geometry.centroid().unwrap_or_else(|| {
        log::warn!("Municipality {} has no centroid", city.code_muni);
        *point
    });

    Ok(CityData {
        city: city.clone(),
        city_centroid: centroid.x_y(),
        would_vanish: city.pop_2019 <= target,
    })
}

/// Finds the municipality containing `point`, reading only the quadrant
/// that holds it.
///
/// # Errors
///
/// Returns [`CityError`] if the point is not covered by exactly one
/// quadrant and exactly one municipality, or the quadrant cannot be read.
pub fn find_user_city(map: &CityMap, point: &Point<f64>, target: u64) -> Result<CityData, CityError> {
    let quadrant = map.quadrant_path(point)?;
    let cities = load_city_polygons(quadrant)?;
    user_city_in(&cities, point, target)
}

fn exactly_one<T>(mut matches: Vec<T>, layer: Layer, point: &Point<f64>) -> Result<T, CityError> {
    match matches.len() {
        0 => Err(CityError::NotFound {
            layer,
            lon: point.x(),
            lat: point.y(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(CityError::Ambiguous {
            layer,
            lon: point.x(),
            lat: point.y(),
            count,
        }),
    }
}
