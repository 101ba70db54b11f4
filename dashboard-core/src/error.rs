use thiserror::Error;

/// Failures surfaced by the weather service client, the geolocation
/// boundary and the saved-location store.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Geocoding returned zero results for the given name.
    #[error("Location \"{0}\" not found")]
    NotFound(String),

    /// Transport failure, non-2xx status or unreadable body from a remote API.
    #[error("{0:#}")]
    Service(anyhow::Error),

    /// The device refused or could not provide a position.
    #[error("{0}")]
    GeolocationDenied(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<anyhow::Error> for WeatherError {
    fn from(err: anyhow::Error) -> Self {
        WeatherError::Service(err)
    }
}

/// Read/write failures of the persisted key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WeatherError>;
