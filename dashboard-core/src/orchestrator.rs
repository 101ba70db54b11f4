//! UI-facing location/weather state machine.
//!
//! Every operation starts by issuing a new request token. Results of an
//! operation are only written to the state while its token is still the
//! latest one; responses that arrive after a newer operation started are
//! dropped. The state lives in a [`watch`] channel so a host can re-render
//! on every applied transition.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::sync::watch;

use crate::{
    error::WeatherError,
    geolocation::Geolocator,
    model::{ForecastRequest, Location, WeatherSnapshot},
    service::WeatherService,
    storage::{KeyValueStore, SavedLocationSet},
};

pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this device";

/// Everything the display layer needs.
///
/// While `loading` is set, `weather` and `error` may still hold values from
/// the previous operation; hosts are expected to hide them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestratorState {
    pub location: Option<Location>,
    pub weather: Option<WeatherSnapshot>,
    pub loading: bool,
    pub error: Option<String>,
    pub saved: SavedLocationSet,
}

impl OrchestratorState {
    pub fn is_settled(&self) -> bool {
        !self.loading && (self.weather.is_some() || self.error.is_some())
    }
}

/// Drives [`OrchestratorState`] through searches, saved-location loads and
/// device-position lookups. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    service: Arc<dyn WeatherService>,
    store: Arc<dyn KeyValueStore>,
    geolocator: Option<Arc<dyn Geolocator>>,
    past_days: Option<u8>,
    forecast_days: Option<u8>,
    state: watch::Sender<OrchestratorState>,
    latest_token: AtomicU64,
}

pub struct OrchestratorBuilder {
    service: Arc<dyn WeatherService>,
    store: Arc<dyn KeyValueStore>,
    geolocator: Option<Arc<dyn Geolocator>>,
    past_days: Option<u8>,
    forecast_days: Option<u8>,
}

impl OrchestratorBuilder {
    pub fn geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.geolocator = Some(geolocator);
        self
    }

    /// Day counts forwarded on every forecast call; `None` leaves the
    /// provider default.
    pub fn days(mut self, past_days: Option<u8>, forecast_days: Option<u8>) -> Self {
        self.past_days = past_days;
        self.forecast_days = forecast_days;
        self
    }

    /// Reads the saved-location list from the store once.
    pub fn build(self) -> Orchestrator {
        let saved = SavedLocationSet::load(self.store.as_ref());
        let (state, _) = watch::channel(OrchestratorState { saved, ..Default::default() });

        Orchestrator {
            inner: Arc::new(Inner {
                service: self.service,
                store: self.store,
                geolocator: self.geolocator,
                past_days: self.past_days,
                forecast_days: self.forecast_days,
                state,
                latest_token: AtomicU64::new(0),
            }),
        }
    }
}

impl Orchestrator {
    pub fn builder(
        service: Arc<dyn WeatherService>,
        store: Arc<dyn KeyValueStore>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder { service, store, geolocator: None, past_days: None, forecast_days: None }
    }

    pub fn new(service: Arc<dyn WeatherService>, store: Arc<dyn KeyValueStore>) -> Self {
        Self::builder(service, store).build()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> OrchestratorState {
        self.inner.state.borrow().clone()
    }

    /// Receiver marked changed on every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.inner.state.subscribe()
    }

    /// Geocode `name`, then fetch its forecast. Whitespace-only input is
    /// ignored; anything else goes to the geocoder exactly as typed.
    pub async fn search_by_name(&self, name: &str) {
        if name.trim().is_empty() {
            return;
        }

        let token = self.begin();
        tracing::info!(name, token, "searching location");

        let location = match self.inner.service.geocode(name).await {
            Ok(location) => location,
            Err(err @ WeatherError::NotFound(_)) => {
                self.fail(token, err.to_string());
                return;
            }
            Err(err) => {
                self.fail(token, format!("Error searching for location: {err}"));
                return;
            }
        };

        if !self.apply(token, |s| s.location = Some(location.clone())) {
            return;
        }
        self.fetch_weather(token, &location, "Error searching for location").await;
    }

    /// Fetch the forecast for a saved location, skipping geocoding.
    pub async fn load_saved(&self, location: Location) {
        let token = self.begin();
        tracing::info!(location = %location.display_name(), token, "loading saved location");

        if !self.apply(token, |s| s.location = Some(location.clone())) {
            return;
        }
        self.fetch_weather(token, &location, "Error loading weather data").await;
    }

    /// Ask the geolocator for the device position, name it, then fetch its forecast.
    pub async fn use_current_position(&self) {
        let token = self.begin();

        let Some(geolocator) = self.inner.geolocator.clone() else {
            self.fail(token, GEOLOCATION_UNSUPPORTED.to_string());
            return;
        };

        let position = match geolocator.current_position().await {
            Ok(position) => position,
            Err(err) => {
                self.fail(token, format!("Error getting your location: {err}"));
                return;
            }
        };
        if !self.is_current(token) {
            tracing::debug!(token, "position arrived after a newer request, dropping");
            return;
        }

        const PREFIX: &str = "Error getting weather for your location";
        let location =
            match self.inner.service.reverse_geocode(position.latitude, position.longitude).await {
                Ok(location) => location,
                Err(err) => {
                    self.fail(token, format!("{PREFIX}: {err}"));
                    return;
                }
            };

        if !self.apply(token, |s| s.location = Some(location.clone())) {
            return;
        }
        self.fetch_weather(token, &location, PREFIX).await;
    }

    /// Add the current location to the saved set unless it is unset or
    /// already saved. Returns whether the set changed.
    pub fn save_current(&self) -> bool {
        let mut changed = None;
        self.inner.state.send_if_modified(|s| {
            let Some(location) = s.location.clone() else {
                return false;
            };
            if !s.saved.add(location) {
                return false;
            }
            changed = Some(s.saved.clone());
            true
        });

        match changed {
            Some(saved) => {
                self.persist(&saved);
                true
            }
            None => false,
        }
    }

    /// Remove the saved entry at `index`. Out of range is a no-op.
    pub fn remove_saved(&self, index: usize) -> Option<Location> {
        let mut removed = None;
        let mut changed = None;
        self.inner.state.send_if_modified(|s| {
            removed = s.saved.remove(index);
            if removed.is_some() {
                changed = Some(s.saved.clone());
            }
            removed.is_some()
        });

        if let Some(saved) = changed {
            self.persist(&saved);
        }
        removed
    }

    async fn fetch_weather(&self, token: u64, location: &Location, error_prefix: &str) {
        let request = ForecastRequest::for_location(location)
            .with_days(self.inner.past_days, self.inner.forecast_days);

        match self.inner.service.fetch_forecast(&request).await {
            Ok(snapshot) => {
                let hours = snapshot.hourly.len();
                let days = snapshot.daily.len();
                if self.apply(token, |s| {
                    s.weather = Some(snapshot);
                    s.loading = false;
                }) {
                    tracing::info!(location = %location.display_name(), hours, days, "weather updated");
                }
            }
            Err(err) => self.fail(token, format!("{error_prefix}: {err}")),
        }
    }

    /// Issue a new token and enter the loading state. The token is bumped
    /// under the state lock so `apply` sees a consistent pair.
    fn begin(&self) -> u64 {
        let mut token = 0;
        self.inner.state.send_modify(|s| {
            token = self.inner.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
            s.loading = true;
            s.error = None;
        });
        token
    }

    fn is_current(&self, token: u64) -> bool {
        self.inner.latest_token.load(Ordering::SeqCst) == token
    }

    /// Run `update` only if `token` is still the latest. Returns whether it ran.
    fn apply(&self, token: u64, update: impl FnOnce(&mut OrchestratorState)) -> bool {
        let applied = self.inner.state.send_if_modified(|s| {
            if !self.is_current(token) {
                return false;
            }
            update(s);
            true
        });
        if !applied {
            tracing::warn!(token, "discarding stale response");
        }
        applied
    }

    fn fail(&self, token: u64, message: String) {
        tracing::info!(token, error = %message, "request failed");
        self.apply(token, |s| {
            s.error = Some(message);
            s.loading = false;
        });
    }

    /// Called with a copy of the set after the state lock is released, so a
    /// slow store never blocks readers.
    fn persist(&self, saved: &SavedLocationSet) {
        if let Err(err) = saved.persist(self.inner.store.as_ref()) {
            tracing::warn!(error = %err, "failed to persist saved locations");
        }
    }
}
