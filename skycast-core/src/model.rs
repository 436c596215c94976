use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city_name: Option<String>,
    /// ISO 3166 alpha-2 country code as reported by the provider.
    pub country: String,
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Normalized `(city, country)` pair used to match stored records.
    ///
    /// Returns `None` when the city name is missing or blank.
    pub fn cache_key(&self) -> Option<(String, String)> {
        let city = self.city_name.as_deref()?.trim();
        if city.is_empty() {
            return None;
        }

        Some((city.to_lowercase(), self.country.trim().to_lowercase()))
    }
}

/// Conditions at one point in time. Secondary fields are optional because
/// the provider may omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Degrees Celsius.
    pub temperature: f64,
    pub weather_description: Option<String>,
    /// Relative humidity, percent.
    pub humidity: Option<u8>,
    /// Meters per second.
    pub wind_speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    pub weather: WeatherInfo,
}

/// Current conditions plus a chronologically ascending daily forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub location: Location,
    pub current: WeatherInfo,
    /// Daily entries; the first one is today, matching `current`.
    pub forecast: Vec<ForecastEntry>,
}

#[derive(Debug, Clone)]
pub struct WeatherParameters {
    pub city: String,
    pub country: String,
    /// Requested forecast window in days.
    pub days: i32,
}

impl WeatherParameters {
    pub fn new(city: impl Into<String>, country: impl Into<String>, days: i32) -> Self {
        Self { city: city.into(), country: country.into(), days }
    }
}

/// Persisted form of a fetch: current conditions only, the forecast is not
/// stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    /// Store-assigned surrogate key; `0` until inserted.
    pub id: i64,
    pub location: Location,
    pub weather_info: WeatherInfo,
    pub recorded_at: DateTime<Utc>,
}

impl WeatherRecord {
    pub fn unsaved(location: Location, weather_info: WeatherInfo) -> Self {
        Self { id: 0, location, weather_info, recorded_at: Utc::now() }
    }
}

impl From<&WeatherData> for WeatherRecord {
    fn from(data: &WeatherData) -> Self {
        Self::unsaved(data.location.clone(), data.current.clone())
    }
}
