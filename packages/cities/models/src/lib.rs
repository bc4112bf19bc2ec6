#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Municipality and state capital types.
//!
//! Field names follow the IBGE municipal tables the city layers are built
//! from (`code_muni`, `name_muni`, `name_state`, `pop_2019`), and are kept
//! as-is in the JSON answer.

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};

/// A municipality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// IBGE municipality code.
    #[serde(deserialize_with = "deserialize_code")]
    pub code_muni: u64,
    /// Municipality name.
    pub name_muni: String,
    /// State name.
    pub name_state: String,
    /// Estimated resident population in 2019.
    pub pop_2019: u64,
}

/// The municipality the query point falls in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityData {
    /// Municipality attributes.
    #[serde(flatten)]
    pub city: City,
    /// Centroid of the municipality polygon as `(lon, lat)`.
    pub city_centroid: (f64, f64),
    /// Whether a population equal to the target would empty the whole city.
    pub would_vanish: bool,
}

/// The nearest municipality no larger than the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborCity {
    /// Municipality attributes.
    #[serde(flatten)]
    pub city: City,
    /// Precomputed municipality centroid as `(lon, lat)`.
    pub city_centroid: (f64, f64),
}

/// A state capital record.
///
/// Only `code_muni` is interpreted; every other field is carried through
/// to the output untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    /// IBGE municipality code.
    #[serde(deserialize_with = "deserialize_code")]
    pub code_muni: u64,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Number(u64),
    Text(String),
}

/// Accepts municipality codes written either as JSON numbers or as
/// numeric strings.
///
/// # Errors
///
/// Fails if the value is neither a non-negative integer nor a string
/// holding one.
pub fn deserialize_code<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawCode::deserialize(deserializer)? {
        RawCode::Number(code) => Ok(code),
        RawCode::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid municipality code {text:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_city() -> City {
        City {
            code_muni: 3_550_308,
            name_muni: "São Paulo".to_string(),
            name_state: "São Paulo".to_string(),
            pop_2019: 12_252_023,
        }
    }

    #[test]
    fn city_data_serializes_flat() {
        let data = CityData {
            city: sample_city(),
            city_centroid: (-46.7, -23.6),
            would_vanish: false,
        };

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["code_muni"], 3_550_308);
        assert_eq!(json["name_muni"], "São Paulo");
        assert_eq!(json["city_centroid"], serde_json::json!([-46.7, -23.6]));
        assert_eq!(json["would_vanish"], false);
        assert!(json.get("city").is_none());
    }

    #[test]
    fn capital_keeps_unknown_fields() {
        let capital: Capital = serde_json::from_str(
            r#"{ "code_muni": "5300108", "name_muni": "Brasília", "radius": 0.12 }"#,
        )
        .unwrap();

        assert_eq!(capital.code_muni, 5_300_108);
        assert_eq!(capital.extra["name_muni"], "Brasília");

        let json = serde_json::to_value(&capital).unwrap();
        assert_eq!(json["code_muni"], 5_300_108);
        assert_eq!(json["radius"], 0.12);
    }

    #[test]
    fn numeric_codes_are_accepted() {
        let capital: Capital = serde_json::from_str(r#"{ "code_muni": 1100205 }"#).unwrap();
        assert_eq!(capital.code_muni, 1_100_205);
        assert!(capital.extra.is_empty());
    }

    #[test]
    fn rejects_non_numeric_codes() {
        assert!(serde_json::from_str::<Capital>(r#"{ "code_muni": "abc" }"#).is_err());
    }
}
