//! Core library for the `skycast` weather client.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The Weatherbit provider client
//! - A SQLite store for fetched conditions
//! - Fetch/save use cases and the observable state controller
//!
//! It is used by `skycast-cli`, but can also be driven by any other front end
//! that observes [`WeatherController`] state.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod provider;
pub mod store;
pub mod usecase;

pub use config::{Config, DefaultLocation, ProviderConfig};
pub use controller::{FetchDefaults, WeatherController, WeatherUiState};
pub use error::{PersistenceError, ProviderError, ValidationError, WeatherError};
pub use model::{
    Coordinates, ForecastEntry, Location, WeatherData, WeatherInfo, WeatherParameters,
    WeatherRecord,
};
pub use provider::{MAX_FORECAST_DAYS, WeatherProvider, provider_from_config};
pub use store::{SqliteWeatherStore, WeatherStore};
pub use usecase::WeatherUseCases;
