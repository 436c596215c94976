//! Human-friendly text output.

use std::fmt::Write;

use skycast_core::{Location, WeatherData, WeatherInfo, WeatherRecord};

pub fn weather_data(data: &WeatherData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", location_name(&data.location));
    let _ = writeln!(out, "  Now: {}", conditions(&data.current));

    if !data.forecast.is_empty() {
        let _ = writeln!(out, "  Forecast:");
        for entry in &data.forecast {
            let _ = writeln!(
                out,
                "    {}  {}",
                entry.date.format("%a %Y-%m-%d"),
                conditions(&entry.weather)
            );
        }
    }

    out
}

pub fn weather_record(record: &WeatherRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", location_name(&record.location));
    let _ = writeln!(
        out,
        "  Saved {}: {}",
        record.recorded_at.format("%Y-%m-%d %H:%M UTC"),
        conditions(&record.weather_info)
    );
    out
}

fn location_name(location: &Location) -> String {
    let city = location.city_name.as_deref().unwrap_or("Unknown Location");
    format!("{city}, {}", location.country)
}

fn conditions(info: &WeatherInfo) -> String {
    let mut parts = vec![format!("{:.1}°C", info.temperature)];

    if let Some(description) = &info.weather_description {
        parts.push(description.clone());
    }
    if let Some(humidity) = info.humidity {
        parts.push(format!("humidity {humidity}%"));
    }
    if let Some(wind) = info.wind_speed {
        parts.push(format!("wind {wind:.1} m/s"));
    }

    parts.join(", ")
}
