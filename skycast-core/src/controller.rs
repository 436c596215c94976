//! Observable state machine driving a weather lookup.
//!
//! The controller publishes a [`WeatherUiState`] through a `watch` channel.
//! Each `fetch_weather` call resets the state to `Loading` and spawns an
//! independent task; overlapping calls are not serialized, so the state
//! reflects whichever task finished last.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::{WeatherData, WeatherParameters};
use crate::usecase::WeatherUseCases;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum WeatherUiState {
    Loading,
    Success(WeatherData),
    Error(String),
}

impl WeatherUiState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }
}

/// Location and window used when the caller does not name a city.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchDefaults {
    pub city: String,
    pub country: String,
    pub forecast_days: u32,
}

pub struct WeatherController {
    use_cases: WeatherUseCases,
    defaults: FetchDefaults,
    state: Arc<watch::Sender<WeatherUiState>>,
    pending_saves: Arc<Mutex<Vec<JoinHandle<()>>>>,
    persistence_failures: Arc<AtomicUsize>,
}

impl WeatherController {
    pub fn new(use_cases: WeatherUseCases, defaults: FetchDefaults) -> Self {
        let (state, _) = watch::channel(WeatherUiState::Loading);
        Self {
            use_cases,
            defaults,
            state: Arc::new(state),
            pending_saves: Arc::new(Mutex::new(Vec::new())),
            persistence_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WeatherUiState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WeatherUiState> {
        self.state.subscribe()
    }

    pub fn defaults(&self) -> &FetchDefaults {
        &self.defaults
    }

    /// Number of detached saves that failed since construction.
    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures.load(Ordering::SeqCst)
    }

    pub fn fetch_default(&self) -> JoinHandle<()> {
        let FetchDefaults { city, country, .. } = self.defaults.clone();
        self.fetch_weather(&city, &country)
    }

    /// Start a lookup. The state is `Loading` by the time this returns; the
    /// returned handle resolves once the state has settled for this call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fetch_weather(&self, city: &str, country: &str) -> JoinHandle<()> {
        self.state.send_replace(WeatherUiState::Loading);

        let days = i32::try_from(self.defaults.forecast_days).unwrap_or(i32::MAX);
        let params = WeatherParameters::new(city, country, days);
        let use_cases = self.use_cases.clone();
        let state = self.state.clone();
        let pending_saves = self.pending_saves.clone();
        let failures = self.persistence_failures.clone();

        tokio::spawn(async move {
            let result = use_cases.get_weather_data(&params).await;
            match result {
                Ok(data) => {
                    tracing::info!(city = %params.city, country = %params.country, "Weather fetch succeeded");
                    state.send_replace(WeatherUiState::Success(data.clone()));

                    let save = tokio::spawn(async move {
                        if let Err(e) = use_cases.save_weather_data(&data).await {
                            failures.fetch_add(1, Ordering::SeqCst);
                            tracing::error!(error = %e, "Failed to persist weather record");
                        }
                    });
                    let mut pending = pending_saves.lock();
                    pending.retain(|handle| !handle.is_finished());
                    pending.push(save);
                }
                Err(e) => {
                    tracing::warn!(city = %params.city, country = %params.country, error = %e, "Weather fetch failed");
                    state.send_replace(WeatherUiState::Error(e.user_message()));
                }
            }
        })
    }

    /// Save tasks still tracked; finished ones are dropped on the next fetch.
    pub fn pending_save_count(&self) -> usize {
        self.pending_saves.lock().len()
    }

    /// Wait for every detached save started so far.
    pub async fn wait_for_saves(&self) {
        loop {
            let handles: Vec<_> = std::mem::take(&mut *self.pending_saves.lock());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    self.persistence_failures.fetch_add(1, Ordering::SeqCst);
                    tracing::error!(error = %e, "Weather save task aborted");
                }
            }
        }
    }
}
