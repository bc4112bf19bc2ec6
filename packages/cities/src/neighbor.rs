//! Nearest municipality no larger than the target.

use std::path::Path;

use equivalent_area_cities_models::{City, NeighborCity};
use equivalent_area_spatial::features::{feature_point, read_features};
use geo::Point;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::{CityError, parse_city};

type CentroidEntry = GeomWithData<[f64; 2], usize>;

/// Municipality centroids indexed for nearest-neighbour queries.
pub struct CityCentroids {
    cities: Vec<(City, Point<f64>)>,
    tree: RTree<CentroidEntry>,
}

impl std::fmt::Debug for CityCentroids {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityCentroids")
            .field("cities", &self.cities.len())
            .finish_non_exhaustive()
    }
}

impl CityCentroids {
    /// Indexes municipalities by centroid.
    #[must_use]
    pub fn new(cities: Vec<(City, Point<f64>)>) -> Self {
        let entries = cities
            .iter()
            .enumerate()
            .map(|(index, (_, centroid))| GeomWithData::new([centroid.x(), centroid.y()], index))
            .collect();

        Self {
            cities,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Loads centroids from a `GeoJSON` collection of `Point` features
    /// carrying municipality attributes.
    ///
    /// # Errors
    ///
    /// Returns [`CityError`] if the file cannot be read or a record is
    /// malformed.
    pub fn load(path: &Path) -> Result<Self, CityError> {
        let features = read_features(path)?;

        let cities = features
            .iter()
            .enumerate()
            .map(|(record, feature)| {
                parse_city(feature)
                    .and_then(|city| {
                        let centroid = feature_point(feature, &city.name_muni)?;
                        Ok((city, centroid))
                    })
                    .map_err(|source| CityError::InvalidRecord {
                        path: path.to_path_buf(),
                        record,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} municipality centroids from {}",
            cities.len(),
            path.display()
        );

        Ok(Self::new(cities))
    }

    /// Number of municipalities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether no municipalities are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// The municipality with `pop_2019 <= target` whose centroid is closest to
/// `point`, by planar distance in coordinate units.
///
/// # Errors
///
/// Returns [`CityError::NoSmallerCity`] if every municipality is larger
/// than the target.
pub fn find_neighboring_city(
    centroids: &CityCentroids,
    point: &Point<f64>,
    target: u64,
) -> Result<NeighborCity, CityError> {
    centroids
        .tree
        .nearest_neighbor_iter(&[point.x(), point.y()])
        .map(|entry| &centroids.cities[entry.data])
        .find(|(city, _)| city.pop_2019 <= target)
        .map(|(city, centroid)| NeighborCity {
            city: city.clone(),
            city_centroid: centroid.x_y(),
        })
        .ok_or(CityError::NoSmallerCity { target })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: u64, pop: u64, x: f64, y: f64) -> (City, Point<f64>) {
        (
            City {
                code_muni: code,
                name_muni: format!("City {code}"),
                name_state: "State".to_string(),
                pop_2019: pop,
            },
            Point::new(x, y),
        )
    }

    #[test]
    fn skips_larger_cities() {
        let centroids = CityCentroids::new(vec![
            entry(1, 1_000_000, 0.1, 0.0),
            entry(2, 900, 2.0, 0.0),
            entry(3, 500, -3.0, 0.0),
        ]);

        let neighbor = find_neighboring_city(&centroids, &Point::new(0.0, 0.0), 1_000).unwrap();
        assert_eq!(neighbor.city.code_muni, 2);
        assert_eq!(neighbor.city_centroid, (2.0, 0.0));
    }

    #[test]
    fn equal_population_qualifies() {
        let centroids = CityCentroids::new(vec![entry(1, 1_000, 5.0, 5.0)]);
        let neighbor = find_neighboring_city(&centroids, &Point::new(0.0, 0.0), 1_000).unwrap();
        assert_eq!(neighbor.city.code_muni, 1);
    }

    #[test]
    fn no_candidate_is_an_error() {
        let centroids = CityCentroids::new(vec![entry(1, 10_000, 0.0, 0.0)]);
        assert!(matches!(
            find_neighboring_city(&centroids, &Point::new(0.0, 0.0), 9_999),
            Err(CityError::NoSmallerCity { target: 9_999 })
        ));
    }

    #[test]
    fn loads_centroid_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("city_centroids.geojson");
        std::fs::write(
            &path,
            r#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": { "code_muni": 1100015, "name_muni": "Alta Floresta D'Oeste", "name_state": "Rondônia", "pop_2019": 22945 },
                        "geometry": { "type": "Point", "coordinates": [-62.0, -11.9] }
                    },
                    {
                        "type": "Feature",
                        "properties": { "code_muni": 1100023, "name_muni": "Ariquemes", "name_state": "Rondônia", "pop_2019": 107863 },
                        "geometry": { "type": "Point", "coordinates": [-63.0, -9.9] }
                    }
                ]
            }"#,
        )
        .unwrap();

        let centroids = CityCentroids::load(&path).unwrap();
        assert_eq!(centroids.len(), 2);

        let neighbor =
            find_neighboring_city(&centroids, &Point::new(-63.0, -10.0), 50_000).unwrap();
        assert_eq!(neighbor.city.name_muni, "Alta Floresta D'Oeste");
    }
}
