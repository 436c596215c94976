//! Fetch and save operations composed from the provider and the store.

use std::sync::Arc;

use crate::error::{PersistenceError, ValidationError, WeatherError};
use crate::model::{WeatherData, WeatherParameters, WeatherRecord};
use crate::provider::WeatherProvider;
use crate::store::WeatherStore;

#[derive(Clone)]
pub struct WeatherUseCases {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn WeatherStore>,
}

impl WeatherUseCases {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: Arc<dyn WeatherStore>) -> Self {
        Self { provider, store }
    }

    /// Fetch live weather. Never consults the store; provider errors are
    /// returned as-is.
    pub async fn get_weather_data(
        &self,
        params: &WeatherParameters,
    ) -> Result<WeatherData, WeatherError> {
        let city = params.city.trim();
        let country = params.country.trim();

        if city.is_empty() {
            return Err(ValidationError::EmptyCity.into());
        }
        if country.is_empty() {
            return Err(ValidationError::EmptyCountry.into());
        }
        let days = u32::try_from(params.days)
            .map_err(|_| ValidationError::InvalidForecastLength(params.days))?;

        let data = self.provider.fetch_weather(city, country, days).await?;
        tracing::debug!(city, country, forecast_days = data.forecast.len(), "Fetched weather");
        Ok(data)
    }

    /// Persist the current conditions of `data` as a new record.
    ///
    /// Always appends; saving the same data twice yields two records.
    pub async fn save_weather_data(&self, data: &WeatherData) -> Result<i64, WeatherError> {
        if data.location.cache_key().is_none() {
            return Err(ValidationError::EmptyCity.into());
        }

        let record = WeatherRecord::from(data);
        let store = self.store.clone();
        let id = tokio::task::spawn_blocking(move || store.insert(&record))
            .await
            .map_err(|e| PersistenceError::WriteFailure(e.to_string()))??;

        tracing::info!(
            id,
            city = data.location.city_name.as_deref().unwrap_or_default(),
            "Saved weather record"
        );
        Ok(id)
    }
}
