//! State capitals shown next to the result.

use std::path::Path;

use equivalent_area_cities_models::Capital;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::CityError;

/// How many capitals are highlighted per query.
pub const CAPITALS_TO_HIGHLIGHT: usize = 2;

/// Reads the capital records, a JSON array of objects with at least a
/// `code_muni` field.
///
/// # Errors
///
/// Returns [`CityError::Io`] or [`CityError::Json`] if the file cannot be
/// read or parsed.
pub fn load_capitals(path: &Path) -> Result<Vec<Capital>, CityError> {
    let text = std::fs::read_to_string(path).map_err(|source| CityError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| CityError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Picks [`CAPITALS_TO_HIGHLIGHT`] distinct capitals at random, never the
/// user's own municipality.
///
/// # Errors
///
/// Returns [`CityError::NotEnoughCapitals`] if fewer candidates remain.
pub fn choose_capitals<R: Rng + ?Sized>(
    capitals: &[Capital],
    user_city: u64,
    rng: &mut R,
) -> Result<Vec<Capital>, CityError> {
    let candidates: Vec<&Capital> = capitals
        .iter()
        .filter(|capital| capital.code_muni != user_city)
        .collect();

    if candidates.len() < CAPITALS_TO_HIGHLIGHT {
        return Err(CityError::NotEnoughCapitals {
            available: candidates.len(),
        });
    }

    Ok(candidates
        .choose_multiple(rng, CAPITALS_TO_HIGHLIGHT)
        .copied()
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::Map;

    fn capital(code: u64) -> Capital {
        Capital {
            code_muni: code,
            extra: Map::new(),
        }
    }

    #[test]
    fn never_picks_user_city() {
        let capitals = vec![capital(1), capital(2), capital(3)];

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let chosen = choose_capitals(&capitals, 2, &mut rng).unwrap();

            let mut codes: Vec<u64> = chosen.iter().map(|c| c.code_muni).collect();
            codes.sort_unstable();
            assert_eq!(codes, vec![1, 3]);
        }
    }

    #[test]
    fn picks_distinct_capitals() {
        let capitals: Vec<Capital> = (1..=27).map(capital).collect();
        let mut rng = StdRng::seed_from_u64(42);

        let chosen = choose_capitals(&capitals, 0, &mut rng).unwrap();
        assert_eq!(chosen.len(), CAPITALS_TO_HIGHLIGHT);
        assert_ne!(chosen[0].code_muni, chosen[1].code_muni);
    }

    #[test]
    fn too_few_candidates() {
        let capitals = vec![capital(1), capital(2)];
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            choose_capitals(&capitals, 1, &mut rng),
            Err(CityError::NotEnoughCapitals { available: 1 })
        ));
    }

    #[test]
    fn loads_capital_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capitals_radius.json");
        std::fs::write(
            &path,
            r#"[
                { "code_muni": 5300108, "name_muni": "Brasília", "radius": 0.21 },
                { "code_muni": "3304557", "name_muni": "Rio de Janeiro", "radius": 0.18 }
            ]"#,
        )
        .unwrap();

        let capitals = load_capitals(&path).unwrap();
        assert_eq!(capitals.len(), 2);
        assert_eq!(capitals[1].code_muni, 3_304_557);
        assert_eq!(capitals[0].extra["name_muni"], "Brasília");
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capitals_radius.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_capitals(&path), Err(CityError::Json { .. })));
    }
}
