//! The end-to-end query.

use equivalent_area_cities::{
    CityCentroids, CityMap, choose_capitals, find_neighboring_city, find_user_city, load_capitals,
};
use equivalent_area_cities_models::{Capital, CityData, NeighborCity};
use equivalent_area_radius::find_radius;
use equivalent_area_radius_models::RadiusData;
use equivalent_area_tiles::{GeoJsonTractSource, ReferenceMap, TileIndex, TractSource, load_tiles_for};
use geo::Point;
use rand::Rng;
use serde::Serialize;

use crate::{DataPaths, JsonTargetSource, Measure, QueryConfig, QueryError, TargetSource};

/// The answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutput {
    /// The query point and a point on the matching circle.
    pub radius: RadiusData,
    /// The municipality the query point is in.
    pub user_city: CityData,
    /// The closest municipality no larger than the target.
    pub neighboring_city: NeighborCity,
    /// Two state capitals to compare against.
    pub capitals_to_highlight: Vec<Capital>,
}

/// The data collaborators a query reads from.
#[derive(Debug)]
pub struct QueryData<I, S> {
    /// Tile reference map.
    pub tiles: I,
    /// Tile dataset provider.
    pub tracts: S,
    /// City quadrant reference map.
    pub cities: CityMap,
    /// Municipality centroids.
    pub centroids: CityCentroids,
    /// State capital records.
    pub capitals: Vec<Capital>,
}

impl QueryData<ReferenceMap, GeoJsonTractSource> {
    /// Loads every reference layer from disk.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] if any file is missing or malformed.
    pub fn load(paths: &DataPaths) -> Result<Self, QueryError> {
        Ok(Self {
            tiles: ReferenceMap::load(&paths.tract_index)?,
            tracts: GeoJsonTractSource,
            cities: CityMap::load(&paths.city_index)?,
            centroids: CityCentroids::load(&paths.city_centroids)?,
            capitals: load_capitals(&paths.capitals)?,
        })
    }
}

impl<I: TileIndex, S: TractSource> QueryData<I, S> {
    /// Answers a query for `point` and a known `target`.
    ///
    /// # Errors
    ///
    /// Returns the first [`QueryError`] raised by tile loading, the radius
    /// search or the municipality lookups.
    pub fn answer<R: Rng + ?Sized>(
        &self,
        point: Point<f64>,
        target: u64,
        config: &QueryConfig,
        rng: &mut R,
    ) -> Result<QueryOutput, QueryError> {
        let dataset = load_tiles_for(
            &self.tiles,
            &self.tracts,
            &point,
            target,
            &config.quadrants,
        )?;

        let outcome = find_radius(point, &dataset, target, &config.search)?;
        log::info!(
            "Radius {} holds {} people (target {target}) after {} + {} evaluations",
            outcome.radius,
            outcome.population,
            outcome.bracket_iterations,
            outcome.refine_iterations
        );

        let user_city = find_user_city(&self.cities, &point, target)?;
        let neighboring_city = find_neighboring_city(&self.centroids, &point, target)?;
        let capitals_to_highlight =
            choose_capitals(&self.capitals, user_city.city.code_muni, rng)?;

        Ok(QueryOutput {
            radius: outcome.data,
            user_city,
            neighboring_city,
            capitals_to_highlight,
        })
    }
}

/// Runs a query for the point at (`lat`, `lon`) against the files named in
/// `config`.
///
/// # Errors
///
/// Returns [`QueryError::InvalidCoordinate`] for non-finite input, or the
/// first error raised while reading data or answering the query.
pub fn run_query<R: Rng + ?Sized>(
    lat: f64,
    lon: f64,
    measure: Measure,
    config: &QueryConfig,
    rng: &mut R,
) -> Result<QueryOutput, QueryError> {
    run_query_with(
        lat,
        lon,
        measure,
        &JsonTargetSource::new(&config.data.case_count),
        config,
        rng,
    )
}

/// Like [`run_query`], with the target taken from `targets`.
///
/// # Errors
///
/// See [`run_query`].
pub fn run_query_with<T, R>(
    lat: f64,
    lon: f64,
    measure: Measure,
    targets: &T,
    config: &QueryConfig,
    rng: &mut R,
) -> Result<QueryOutput, QueryError>
where
    T: TargetSource + ?Sized,
    R: Rng + ?Sized,
{
    if !(lat.is_finite() && lon.is_finite()) {
        return Err(QueryError::InvalidCoordinate { lat, lon });
    }
    let point = Point::new(lon, lat);

    let target = targets.current_target(measure)?;
    let data = QueryData::load(&config.data)?;

    data.answer(point, target, config, rng)
}
