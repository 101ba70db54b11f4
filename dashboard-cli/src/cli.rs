use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, CustomUserError, validator::Validation};
use weather_dashboard_core::{
    Config, Coordinates, FileStore, FixedPosition, Orchestrator, OrchestratorState,
    config::MAX_FORECAST_DAYS, service_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard in the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a place by name and show its weather.
    Search {
        /// Place name, e.g. "Paris".
        name: String,

        /// Also add the place to the saved locations.
        #[arg(long)]
        save: bool,
    },

    /// Show weather for the device position (configured home, or --lat/--lon).
    Here {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Manage saved locations.
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Interactively edit forecast length and home position.
    Configure,
}

#[derive(Debug, Subcommand)]
pub enum SavedAction {
    /// List saved locations.
    List,

    /// Look up a place and save it.
    Add { name: String },

    /// Show weather for a saved location (numbered as in `list`).
    Show { number: usize },

    /// Remove a saved location (numbered as in `list`).
    Remove { number: usize },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Search { name, save } => {
                let dashboard = build_dashboard(&config, None)?;
                dashboard.search_by_name(&name).await;
                if save && dashboard.save_current() {
                    println!("Saved {name}.");
                }
                settle(&dashboard.state())
            }
            Command::Here { lat, lon } => {
                let position = lat.zip(lon).map(|(latitude, longitude)| Coordinates {
                    latitude,
                    longitude,
                });
                let dashboard = build_dashboard(&config, position)?;
                dashboard.use_current_position().await;
                settle(&dashboard.state())
            }
            Command::Saved { action } => saved(&config, action).await,
        }
    }
}

async fn saved(config: &Config, action: SavedAction) -> anyhow::Result<()> {
    let dashboard = build_dashboard(config, None)?;

    match action {
        SavedAction::List => {
            print!("{}", render::saved(&dashboard.state().saved));
            Ok(())
        }
        SavedAction::Add { name } => {
            dashboard.search_by_name(&name).await;
            let state = dashboard.state();
            if let Some(error) = &state.error {
                bail!("{error}");
            }
            if dashboard.save_current() {
                println!("Saved {}.", describe_location(&dashboard.state()));
            } else {
                println!("{} is already saved.", describe_location(&state));
            }
            Ok(())
        }
        SavedAction::Show { number } => {
            let location = number
                .checked_sub(1)
                .and_then(|index| dashboard.state().saved.get(index).cloned())
                .ok_or_else(|| anyhow!("No saved location #{number}"))?;
            dashboard.load_saved(location).await;
            settle(&dashboard.state())
        }
        SavedAction::Remove { number } => {
            let removed = number.checked_sub(1).and_then(|index| dashboard.remove_saved(index));
            match removed {
                Some(location) => println!("Removed {}.", location.display_name()),
                None => println!("No saved location #{number}, nothing removed."),
            }
            Ok(())
        }
    }
}

fn build_dashboard(
    config: &Config,
    position: Option<Coordinates>,
) -> anyhow::Result<Orchestrator> {
    let service = service_from_config(config)?;
    let store = Arc::new(FileStore::new(config.data_dir()?));

    let mut builder =
        Orchestrator::builder(service, store).days(config.past_days, config.forecast_days);
    if let Some(position) = position.or(config.home) {
        builder = builder.geolocator(Arc::new(FixedPosition(position)));
    }

    Ok(builder.build())
}

/// Print the settled state; a surfaced error becomes the exit status.
fn settle(state: &OrchestratorState) -> anyhow::Result<()> {
    print!("{}", render::dashboard(state));
    match &state.error {
        Some(error) => bail!("{error}"),
        None => Ok(()),
    }
}

fn describe_location(state: &OrchestratorState) -> String {
    state
        .location
        .as_ref()
        .map(|l| l.display_name())
        .unwrap_or_else(|| "location".to_string())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let days = CustomType::<u8>::new("Forecast days:")
        .with_default(config.forecast_days.unwrap_or(7))
        .with_help_message("Number of days in the daily outlook (1-16)")
        .with_validator(|days: &u8| -> Result<Validation, CustomUserError> {
            Ok(if (1..=MAX_FORECAST_DAYS).contains(days) {
                Validation::Valid
            } else {
                Validation::Invalid(format!("Enter a value between 1 and {MAX_FORECAST_DAYS}").into())
            })
        })
        .prompt()
        .context("Failed to read forecast days")?;
    config.forecast_days = Some(days);

    let set_home = Confirm::new("Set a home position for `here`?")
        .with_default(config.home.is_none())
        .prompt()
        .context("Failed to read answer")?;

    if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .prompt()
            .context("Failed to read longitude")?;
        config.home = Some(Coordinates { latitude, longitude });
    }

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}
