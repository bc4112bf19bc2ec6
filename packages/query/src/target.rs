//! Target population: the current death or case count.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::QueryError;

/// Which count the circle should match.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Measure {
    /// Confirmed deaths.
    #[default]
    Deaths,
    /// Confirmed cases.
    Cases,
}

/// Supplies the target population for a measure.
pub trait TargetSource {
    /// Current count for `measure`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if the count cannot be obtained.
    fn current_target(&self, measure: Measure) -> Result<u64, QueryError>;
}

/// A target fixed up front, whatever the measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTarget(pub u64);

impl TargetSource for FixedTarget {
    fn current_target(&self, _measure: Measure) -> Result<u64, QueryError> {
        Ok(self.0)
    }
}

/// Reads counts from a JSON object keyed by measure, e.g.
/// `{"deaths": 1000, "cases": 50000}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonTargetSource {
    path: PathBuf,
}

impl JsonTargetSource {
    /// Creates a source reading `path` on every call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TargetSource for JsonTargetSource {
    fn current_target(&self, measure: Measure) -> Result<u64, QueryError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| QueryError::Io {
            path: self.path.clone(),
            source,
        })?;

        let counts: Map<String, Value> =
            serde_json::from_str(&text).map_err(|source| QueryError::Json {
                path: self.path.clone(),
                source,
            })?;

        let value = counts
            .get(measure.as_ref())
            .ok_or_else(|| QueryError::MissingMeasure {
                measure,
                path: self.path.clone(),
            })?;

        let target = count_from(value).ok_or_else(|| QueryError::InvalidTarget {
            measure,
            value: value.to_string(),
        })?;

        log::info!("Target for {measure}: {target}");

        Ok(target)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn count_from(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|count| count.is_finite() && *count >= 0.0)
            .map(|count| count.round_ties_even() as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn write_counts(contents: &str) -> (tempfile::TempDir, JsonTargetSource) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case_count.json");
        std::fs::write(&path, contents).unwrap();
        (dir, JsonTargetSource::new(path))
    }

    #[test]
    fn measure_names() {
        assert_eq!(Measure::from_str("deaths").unwrap(), Measure::Deaths);
        assert_eq!(Measure::from_str("cases").unwrap(), Measure::Cases);
        assert!(Measure::from_str("recoveries").is_err());
        assert_eq!(Measure::Cases.to_string(), "cases");
        assert_eq!(Measure::default(), Measure::Deaths);
    }

    #[test]
    fn reads_each_measure() {
        let (_dir, source) = write_counts(r#"{ "deaths": 171974, "cases": 6020164 }"#);
        assert_eq!(source.current_target(Measure::Deaths).unwrap(), 171_974);
        assert_eq!(source.current_target(Measure::Cases).unwrap(), 6_020_164);
    }

    #[test]
    fn rounds_fractional_counts() {
        let (_dir, source) = write_counts(r#"{ "deaths": 99.6 }"#);
        assert_eq!(source.current_target(Measure::Deaths).unwrap(), 100);
    }

    #[test]
    fn half_counts_round_to_even() {
        let (_dir, source) = write_counts(r#"{ "deaths": 100.5, "cases": 101.5 }"#);
        assert_eq!(source.current_target(Measure::Deaths).unwrap(), 100);
        assert_eq!(source.current_target(Measure::Cases).unwrap(), 102);
    }

    #[test]
    fn missing_measure() {
        let (_dir, source) = write_counts(r#"{ "deaths": 10 }"#);
        assert!(matches!(
            source.current_target(Measure::Cases),
            Err(QueryError::MissingMeasure {
                measure: Measure::Cases,
                ..
            })
        ));
    }

    #[test]
    fn negative_count_is_invalid() {
        let (_dir, source) = write_counts(r#"{ "deaths": -4 }"#);
        assert!(matches!(
            source.current_target(Measure::Deaths),
            Err(QueryError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn fixed_target_ignores_measure() {
        assert_eq!(FixedTarget(42).current_target(Measure::Cases).unwrap(), 42);
    }
}
