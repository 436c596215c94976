use crate::{Config, error::ProviderError, model::WeatherData, provider::weatherbit::WeatherbitProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weatherbit;

/// Largest daily forecast window the provider serves.
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Clamp a requested forecast window to what the provider can serve.
pub fn clamp_forecast_days(days: u32) -> u32 {
    days.min(MAX_FORECAST_DAYS)
}

/// Remote source of current and forecast weather.
///
/// Implementations issue exactly one outbound request per call and keep no
/// state between calls.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather(
        &self,
        city: &str,
        country: &str,
        days: u32,
    ) -> Result<WeatherData, ProviderError>;
}

/// Construct the provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key()?.to_owned();

    let provider = match &config.provider.base_url {
        Some(base_url) => WeatherbitProvider::with_base_url(api_key, base_url.clone())?,
        None => WeatherbitProvider::new(api_key)?,
    };

    Ok(Box::new(provider))
}
