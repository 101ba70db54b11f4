//! Device position boundary.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{Result, WeatherError},
    model::Coordinates,
};

/// Source of the device's current position. Failures are reported as
/// [`WeatherError::GeolocationDenied`] carrying the platform's message.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates>;
}

/// Reports a fixed, configured position.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl Geolocator for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates> {
        Ok(self.0)
    }
}

/// Always refuses, with the given message.
#[derive(Debug, Clone)]
pub struct DeniedPosition(pub String);

#[async_trait]
impl Geolocator for DeniedPosition {
    async fn current_position(&self) -> Result<Coordinates> {
        Err(WeatherError::GeolocationDenied(self.0.clone()))
    }
}
