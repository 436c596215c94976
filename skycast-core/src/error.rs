//! Error taxonomy for the fetch-and-persist pipeline.

use thiserror::Error;

/// Failure talking to the remote weather provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Weather provider unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("No weather data for {city}, {country}")]
    NotFound { city: String, country: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Rate limited by weather provider")]
    RateLimited,

    #[error("Weather provider rejected the API key")]
    Unauthorized,

    #[error("Weather provider returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("Failed to open weather store: {0}")]
    Open(String),

    #[error("Failed to write weather record: {0}")]
    WriteFailure(String),

    #[error("Failed to read weather records: {0}")]
    ReadFailure(String),
}

/// Rejected input, raised before any network call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("City name must not be empty")]
    EmptyCity,

    #[error("Country code must not be empty")]
    EmptyCountry,

    #[error("Invalid forecast length: {0}")]
    InvalidForecastLength(i32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl WeatherError {
    /// User-friendly error message for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(e) => match e {
                ProviderError::NetworkUnreachable(_) => {
                    "Unable to reach the weather service. Check your connection.".to_string()
                }
                ProviderError::NotFound { city, country } => {
                    format!("No weather found for \"{city}\" ({country}).")
                }
                ProviderError::MalformedResponse(_) => {
                    "The weather service sent an unexpected response.".to_string()
                }
                ProviderError::RateLimited => {
                    "Too many requests. Please try again later.".to_string()
                }
                ProviderError::Unauthorized => {
                    "The weather service rejected the API key.".to_string()
                }
                ProviderError::UnexpectedStatus { .. } => {
                    "The weather service is unavailable right now.".to_string()
                }
            },
            Self::Persistence(_) => "Could not access saved weather.".to_string(),
            Self::Validation(e) => match e {
                ValidationError::EmptyCity => "Please enter a city name.".to_string(),
                ValidationError::EmptyCountry => "Please enter a country code.".to_string(),
                ValidationError::InvalidForecastLength(days) => {
                    format!("A forecast of {days} days is not possible.")
                }
            },
        }
    }
}
