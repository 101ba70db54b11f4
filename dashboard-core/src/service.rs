use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    error::Result,
    model::{ForecastRequest, Location, WeatherSnapshot},
};

pub mod open_meteo;

pub use open_meteo::OpenMeteoClient;

/// Name shown for a device position that reverse geocoding could not resolve.
pub const CURRENT_LOCATION_NAME: &str = "Current Location";

/// Remote lookups the dashboard depends on. Implementations never retry and
/// never cache.
#[async_trait]
pub trait WeatherService: Send + Sync + Debug {
    /// Resolve a place name to its top match.
    /// Fails with `NotFound` when the lookup yields no result.
    async fn geocode(&self, name: &str) -> Result<Location>;

    /// Name the place at the given coordinates. Falls back to a synthetic
    /// "Current Location" rather than failing when nothing matches.
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Location>;

    async fn fetch_forecast(&self, request: &ForecastRequest) -> Result<WeatherSnapshot>;
}

/// Construct the Open-Meteo service from config.
pub fn service_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherService>> {
    let client = OpenMeteoClient::builder()
        .forecast_url(config.forecast_url())
        .geocoding_url(config.geocoding_url())
        .timeout(config.timeout())
        .build()?;

    Ok(Arc::new(client))
}

/// Synthetic location for a position that could not be named.
pub fn unnamed_location(latitude: f64, longitude: f64) -> Location {
    Location {
        name: CURRENT_LOCATION_NAME.to_string(),
        latitude,
        longitude,
        country: String::new(),
        timezone: crate::model::AUTO_TIMEZONE.to_string(),
    }
}
