//! Tile dataset loading.

use equivalent_area_spatial::SpatialError;
use equivalent_area_spatial::features::{
    feature_multipolygon, property_f64, property_string, read_features,
};
use equivalent_area_tiles_models::{Tile, Tract};

use crate::TileError;

/// Supplies the tracts that make up a tile.
pub trait TractSource {
    /// Loads every tract of `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::DatasetUnavailable`] if the dataset is missing
    /// or cannot be read.
    fn load_tracts(&self, tile: &Tile) -> Result<Vec<Tract>, TileError>;
}

/// Reads tile datasets stored as `GeoJSON` feature collections at
/// [`Tile::data_path`].
///
/// Each feature is a tract with properties `tract_id` (or `CD_GEOCODI`)
/// and `population` (or `populacao_residente`). A `null` population
/// counts as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonTractSource;

impl TractSource for GeoJsonTractSource {
    fn load_tracts(&self, tile: &Tile) -> Result<Vec<Tract>, TileError> {
        let unavailable = |source| TileError::DatasetUnavailable {
            tile: tile.id.clone(),
            source,
        };

        let features = read_features(&tile.data_path).map_err(unavailable)?;

        let tracts = features
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let tract_id = property_string(feature, &["tract_id", "CD_GEOCODI"])?;
                let geometry = feature_multipolygon(feature, &tract_id)?;
                let population = property_f64(feature, &["population", "populacao_residente"])?
                    .unwrap_or(0.0);

                if !(population.is_finite() && population >= 0.0) {
                    return Err(SpatialError::InvalidProperty {
                        key: format!("population (feature {i})"),
                        value: population.to_string(),
                    });
                }

                Ok(Tract {
                    tract_id,
                    geometry,
                    population,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(unavailable)?;

        log::debug!(
            "Read {} tracts for tile {} from {}",
            tracts.len(),
            tile.id,
            tile.data_path.display()
        );

        Ok(tracts)
    }
}
