use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL, DEFAULT_TIMEOUT_SECS},
    error::{Result, WeatherError},
    model::{ForecastRequest, Location, WeatherSnapshot},
};

use super::{WeatherService, unnamed_location};

/// Hourly variables requested on every forecast call.
pub const HOURLY_VARIABLES: [&str; 7] = [
    "temperature_2m",
    "relativehumidity_2m",
    "precipitation_probability",
    "precipitation",
    "weathercode",
    "windspeed_10m",
    "winddirection_10m",
];

/// Daily variables requested on every forecast call.
pub const DAILY_VARIABLES: [&str; 5] = [
    "weathercode",
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "precipitation_probability_max",
];

/// Client for the Open-Meteo forecast and geocoding APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    forecast_url: String,
    geocoding_url: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClientBuilder {
    forecast_url: String,
    geocoding_url: String,
    timeout: Duration,
}

impl OpenMeteoClientBuilder {
    pub fn forecast_url(mut self, url: impl Into<String>) -> Self {
        self.forecast_url = url.into();
        self
    }

    pub fn geocoding_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> anyhow::Result<OpenMeteoClient> {
        let http = Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("weather-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(OpenMeteoClient {
            forecast_url: self.forecast_url,
            geocoding_url: self.geocoding_url,
            http,
        })
    }
}

impl OpenMeteoClient {
    pub fn builder() -> OpenMeteoClientBuilder {
        OpenMeteoClientBuilder {
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn new() -> anyhow::Result<Self> {
        Self::builder().build()
    }

    /// GET `url` with `query` and decode the JSON body. `what` names the API
    /// in error context.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> anyhow::Result<T> {
        tracing::debug!(url, ?query, "Open-Meteo {what} request");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Open-Meteo {what} API"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo {what} request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse Open-Meteo {what} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
}

impl GeoResult {
    fn into_location(self, latitude: f64, longitude: f64) -> Location {
        Location {
            name: self.name,
            latitude,
            longitude,
            country: self.country.unwrap_or_default(),
            timezone: self.timezone.unwrap_or_else(|| crate::model::AUTO_TIMEZONE.to_string()),
        }
    }
}

#[async_trait]
impl WeatherService for OpenMeteoClient {
    async fn geocode(&self, name: &str) -> Result<Location> {
        let query = [
            ("name", name.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let parsed: GeoResponse = self.get_json(&self.geocoding_url, &query, "geocoding").await?;

        let first = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(name.to_string()))?;

        let (latitude, longitude) = (first.latitude, first.longitude);
        let location = first.into_location(latitude, longitude);
        tracing::info!(query = name, resolved = %location.display_name(), "geocoded location");
        Ok(location)
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Location> {
        let query = [
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("count", "1".to_string()),
            ("language", "en".to_string()),
            ("format", "json".to_string()),
        ];

        let parsed: GeoResponse =
            self.get_json(&self.geocoding_url, &query, "reverse geocoding").await?;

        let location = match parsed.results.into_iter().next() {
            // The device position stays authoritative; only naming comes from the lookup.
            Some(first) => first.into_location(latitude, longitude),
            None => {
                tracing::debug!(latitude, longitude, "no place found for position");
                unnamed_location(latitude, longitude)
            }
        };

        tracing::info!(resolved = %location.display_name(), "reverse geocoded position");
        Ok(location)
    }

    async fn fetch_forecast(&self, request: &ForecastRequest) -> Result<WeatherSnapshot> {
        let query = forecast_query(request);
        let snapshot = self.get_json(&self.forecast_url, &query, "forecast").await?;
        Ok(snapshot)
    }
}

fn forecast_query(request: &ForecastRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("latitude", request.latitude.to_string()),
        ("longitude", request.longitude.to_string()),
        ("timezone", request.timezone_or_auto().to_string()),
        ("current_weather", "true".to_string()),
        ("hourly", HOURLY_VARIABLES.join(",")),
        ("daily", DAILY_VARIABLES.join(",")),
    ];

    if let Some(days) = request.past_days {
        query.push(("past_days", days.to_string()));
    }
    if let Some(days) = request.forecast_days {
        query.push(("forecast_days", days.to_string()));
    }

    query
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
