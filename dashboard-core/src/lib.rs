//! Core library for the weather dashboard.
//!
//! This crate defines:
//! - The Open-Meteo client (geocoding, reverse geocoding, forecasts)
//! - The location/weather orchestrator a host UI drives and renders
//! - The persisted saved-location list
//! - Configuration and the weather code table
//!
//! It is used by `weather-dashboard-cli`, but any host that can render
//! [`OrchestratorState`] can embed it.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod orchestrator;
pub mod service;
pub mod storage;
pub mod weather_code;

pub use config::Config;
pub use error::{StorageError, WeatherError};
pub use geolocation::{FixedPosition, Geolocator};
pub use model::{
    Coordinates, CurrentConditions, DailyPoint, DailySeries, ForecastRequest, HourlyPoint,
    HourlySeries, Location, WeatherSnapshot,
};
pub use orchestrator::{Orchestrator, OrchestratorState};
pub use service::{OpenMeteoClient, WeatherService, service_from_config};
pub use storage::{FileStore, KeyValueStore, MemoryStore, SavedLocationSet};
pub use weather_code::{Descriptor, describe};
