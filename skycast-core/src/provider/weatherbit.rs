use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::ProviderError,
    model::{Coordinates, ForecastEntry, Location, WeatherData, WeatherInfo},
    provider::clamp_forecast_days,
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherbit.io/v2.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the Weatherbit daily forecast endpoint.
#[derive(Debug, Clone)]
pub struct WeatherbitProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherbitProvider {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ProviderError::NetworkUnreachable(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WbWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WbDay {
    valid_date: NaiveDate,
    temp: Option<f64>,
    rh: Option<i64>,
    wind_spd: Option<f64>,
    weather: Option<WbWeather>,
}

/// Weatherbit reports coordinates as either strings or numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WbCoord {
    Number(f64),
    Text(String),
}

impl WbCoord {
    fn value(&self) -> Option<f64> {
        match self {
            WbCoord::Number(n) => Some(*n),
            WbCoord::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WbForecastResponse {
    city_name: Option<String>,
    country_code: Option<String>,
    lat: Option<WbCoord>,
    lon: Option<WbCoord>,
    #[serde(default)]
    data: Vec<WbDay>,
}

#[async_trait]
impl WeatherProvider for WeatherbitProvider {
    async fn fetch_weather(
        &self,
        city: &str,
        country: &str,
        days: u32,
    ) -> Result<WeatherData, ProviderError> {
        let days = clamp_forecast_days(days);
        let url = format!("{}/forecast/daily", self.base_url);
        // The first daily entry doubles as the current conditions.
        let requested = days.max(1).to_string();

        tracing::debug!(city, country, days, "Requesting Weatherbit daily forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("city", city),
                ("country", country),
                ("key", self.api_key.as_str()),
                ("days", requested.as_str()),
                ("units", "M"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::NetworkUnreachable(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ProviderError::NetworkUnreachable(e.to_string()))?;

        match status {
            // Weatherbit answers an unknown city with 204 and an empty body.
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
                return Err(ProviderError::NotFound {
                    city: city.to_string(),
                    country: country.to_string(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimited),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Unauthorized);
            }
            s if !s.is_success() => {
                return Err(ProviderError::UnexpectedStatus {
                    status: s.as_u16(),
                    body: truncate_body(&body),
                });
            }
            _ => {}
        }

        let parsed: WbForecastResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        into_weather_data(parsed, country, days as usize)
    }
}

fn into_weather_data(
    parsed: WbForecastResponse,
    requested_country: &str,
    days: usize,
) -> Result<WeatherData, ProviderError> {
    let city_name = parsed
        .city_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("missing city_name".to_string()))?;

    let coordinates = match (
        parsed.lat.as_ref().and_then(WbCoord::value),
        parsed.lon.as_ref().and_then(WbCoord::value),
    ) {
        (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
        _ => None,
    };

    let location = Location {
        city_name: Some(city_name),
        country: parsed.country_code.unwrap_or_else(|| requested_country.to_string()),
        coordinates,
    };

    let needed = days.max(1);
    if parsed.data.len() < needed {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {needed} daily entries, got {}",
            parsed.data.len()
        )));
    }

    let mut days_by_date = parsed.data;
    days_by_date.sort_by_key(|day| day.valid_date);

    let entries = days_by_date
        .into_iter()
        .take(needed)
        .map(|day| {
            let date = day.valid_date;
            weather_info(day).map(|info| (date, info))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    let current = entries
        .first()
        .map(|(_, info)| info.clone())
        .ok_or_else(|| ProviderError::MalformedResponse("no daily entries".to_string()))?;

    let forecast = entries
        .into_iter()
        .take(days)
        .map(|(date, weather)| ForecastEntry { date, weather })
        .collect();

    Ok(WeatherData { location, current, forecast })
}

fn weather_info(day: WbDay) -> Result<WeatherInfo, ProviderError> {
    let temperature = day.temp.ok_or_else(|| {
        ProviderError::MalformedResponse(format!("missing temp for {}", day.valid_date))
    })?;

    Ok(WeatherInfo {
        temperature,
        weather_description: day.weather.and_then(|w| w.description),
        humidity: day.rh.and_then(|rh| u8::try_from(rh).ok()).filter(|rh| *rh <= 100),
        wind_speed: day.wind_spd.filter(|speed| *speed >= 0.0),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
