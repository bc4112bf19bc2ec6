//! `GeoJSON` feature collection reading and property extraction.
//!
//! The tile index, tile datasets and city layers are all stored as
//! `GeoJSON` feature collections. Property lookups accept a list of
//! aliases so that both the short names used here and the raw
//! census column names (e.g. `CD_GEOCODI`) are understood.

use std::path::Path;

use geo::MultiPolygon;
use geojson::{Feature, GeoJson};
use serde_json::Value;

use crate::SpatialError;

/// Reads every feature of a `GeoJSON` `FeatureCollection` file.
///
/// # Errors
///
/// Returns [`SpatialError`] if the file cannot be read, is not valid
/// `GeoJSON`, or is not a feature collection.
pub fn read_features(path: &Path) -> Result<Vec<Feature>, SpatialError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SpatialError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_features(&contents).map_err(|e| match e {
        ParseFailure::Json(source) => SpatialError::GeoJson {
            path: path.to_path_buf(),
            source: Box::new(source),
        },
        ParseFailure::NotACollection => SpatialError::NotAFeatureCollection {
            path: path.to_path_buf(),
        },
    })
}

enum ParseFailure {
    Json(geojson::Error),
    NotACollection,
}

fn parse_features(contents: &str) -> Result<Vec<Feature>, ParseFailure> {
    match contents.parse::<GeoJson>().map_err(ParseFailure::Json)? {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(ParseFailure::NotACollection),
    }
}

/// Converts a feature's geometry into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon` geometry types.
///
/// # Errors
///
/// Returns [`SpatialError`] if the feature has no geometry or the geometry
/// is not polygonal.
pub fn feature_multipolygon(
    feature: &Feature,
    label: &str,
) -> Result<MultiPolygon<f64>, SpatialError> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| SpatialError::MissingGeometry {
            feature: label.to_string(),
        })?;

    let kind = geometry_kind(&geometry.value).to_string();
    let geo_geom: geo::Geometry<f64> = geometry
        .try_into()
        .map_err(|_| SpatialError::UnsupportedGeometry { kind: kind.clone() })?;

    match geo_geom {
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        _ => Err(SpatialError::UnsupportedGeometry { kind }),
    }
}

/// Converts a feature's geometry into a point.
///
/// # Errors
///
/// Returns [`SpatialError`] if the feature has no geometry or the geometry
/// is not a `Point`.
pub fn feature_point(feature: &Feature, label: &str) -> Result<geo::Point<f64>, SpatialError> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| SpatialError::MissingGeometry {
            feature: label.to_string(),
        })?;

    let kind = geometry_kind(&geometry.value).to_string();
    match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geo::Geometry::Point(point)) => Ok(point),
        _ => Err(SpatialError::UnsupportedGeometry { kind }),
    }
}

const fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn lookup<'a>(feature: &'a Feature, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
    let properties = feature.properties.as_ref()?;
    keys.iter()
        .find_map(|key| properties.get_key_value(*key))
        .map(|(key, value)| (key.as_str(), value))
}

fn missing(keys: &[&str]) -> SpatialError {
    SpatialError::MissingProperty {
        key: keys.first().copied().unwrap_or_default().to_string(),
    }
}

/// Reads a string-like property (strings and numbers are both accepted).
///
/// # Errors
///
/// Returns [`SpatialError`] if none of `keys` is present, or the value is
/// neither a string nor a number.
pub fn property_string(feature: &Feature, keys: &[&str]) -> Result<String, SpatialError> {
    let (key, value) = lookup(feature, keys).ok_or_else(|| missing(keys))?;
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(SpatialError::InvalidProperty {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Reads a numeric property. `null` reads as `None`; numeric strings are
/// parsed.
///
/// # Errors
///
/// Returns [`SpatialError`] if none of `keys` is present, or the value
/// cannot be read as a number.
pub fn property_f64(feature: &Feature, keys: &[&str]) -> Result<Option<f64>, SpatialError> {
    let (key, value) = lookup(feature, keys).ok_or_else(|| missing(keys))?;
    let invalid = || SpatialError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or_else(invalid),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Reads an optional property, returning the raw JSON value.
#[must_use]
pub fn property_value<'a>(feature: &'a Feature, keys: &[&str]) -> Option<&'a Value> {
    lookup(feature, keys).map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "CD_GEOCODI": 355030801000001, "populacao_residente": "812" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0, 0], [2, 0], [2, 1], [0, 1], [0, 0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "name": "centroid", "pop": null },
                "geometry": { "type": "Point", "coordinates": [1.5, -2.0] }
            }
        ]
    }"#;

    fn features() -> Vec<Feature> {
        parse_features(COLLECTION).unwrap_or_else(|_| panic!("fixture should parse"))
    }

    #[test]
    fn reads_polygon_feature() {
        let features = features();
        let mp = feature_multipolygon(&features[0], "0").unwrap();
        assert_eq!(mp.0.len(), 1);
        assert!((mp.unsigned_area() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_point_as_polygon() {
        let features = features();
        assert!(matches!(
            feature_multipolygon(&features[1], "1"),
            Err(SpatialError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn reads_point_feature() {
        let features = features();
        let point = feature_point(&features[1], "1").unwrap();
        assert!((point.x() - 1.5).abs() < f64::EPSILON);
        assert!((point.y() - -2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn property_aliases_and_coercion() {
        let features = features();
        assert_eq!(
            property_string(&features[0], &["tract_id", "CD_GEOCODI"]).unwrap(),
            "355030801000001"
        );
        assert_eq!(
            property_f64(&features[0], &["population", "populacao_residente"]).unwrap(),
            Some(812.0)
        );
        assert_eq!(property_f64(&features[1], &["pop"]).unwrap(), None);
    }

    #[test]
    fn missing_property_names_first_alias() {
        let features = features();
        match property_string(&features[1], &["tract_id", "CD_GEOCODI"]) {
            Err(SpatialError::MissingProperty { key }) => assert_eq!(key, "tract_id"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_collection() {
        let single = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(
            parse_features(single),
            Err(ParseFailure::NotACollection)
        ));
    }
}
