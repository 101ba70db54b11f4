use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinates;

pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Open-Meteo serves at most 16 forecast days.
pub const MAX_FORECAST_DAYS: u8 = 16;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// forecast_days = 7
///
/// [home]
/// latitude = 48.8566
/// longitude = 2.3522
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Override of the forecast endpoint, e.g. for a self-hosted Open-Meteo.
    pub forecast_url: Option<String>,

    /// Override of the geocoding endpoint.
    pub geocoding_url: Option<String>,

    pub timeout_secs: Option<u64>,

    pub forecast_days: Option<u8>,

    pub past_days: Option<u8>,

    /// Directory holding the saved-location store.
    pub data_dir: Option<PathBuf>,

    /// Position reported as the device location by hosts without a
    /// positioning service.
    pub home: Option<Coordinates>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(days) = self.forecast_days {
            if days == 0 || days > MAX_FORECAST_DAYS {
                bail!("forecast_days must be between 1 and {MAX_FORECAST_DAYS}, got {days}");
            }
        }
        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory for persisted dashboard state, honouring the `data_dir` override.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn forecast_url(&self) -> &str {
        self.forecast_url.as_deref().unwrap_or(DEFAULT_FORECAST_URL)
    }

    pub fn geocoding_url(&self) -> &str {
        self.geocoding_url.as_deref().unwrap_or(DEFAULT_GEOCODING_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-dashboard", "weather-dashboard")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
