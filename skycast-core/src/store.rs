//! Local persistence of fetched weather.
//!
//! Records are append-only: every successful save inserts a new row and the
//! newest row for a city is its effective value.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

use crate::error::PersistenceError;
use crate::model::{Coordinates, Location, WeatherInfo, WeatherRecord};

pub trait WeatherStore: Send + Sync {
    /// Append a record and return its surrogate id. The record's own `id` is ignored.
    fn insert(&self, record: &WeatherRecord) -> Result<i64, PersistenceError>;

    /// Most recently inserted record whose city name matches, ignoring case.
    fn query_latest_by_city(&self, city: &str) -> Result<Option<WeatherRecord>, PersistenceError>;

    fn count(&self) -> Result<usize, PersistenceError>;
}

/// SQLite-backed weather store.
pub struct SqliteWeatherStore {
    conn: Mutex<Connection>,
}

impl SqliteWeatherStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Open(format!("{}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| PersistenceError::Open(format!("{}: {}", path.display(), e)))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn =
            Connection::open_in_memory().map_err(|e| PersistenceError::Open(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PersistenceError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS weather_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_name TEXT,
                country TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                temperature REAL NOT NULL,
                weather_description TEXT,
                humidity INTEGER,
                wind_speed REAL,
                recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_weather_records_city
                ON weather_records(city_name COLLATE NOCASE);
            "#,
        )
        .map_err(|e| PersistenceError::Open(e.to_string()))?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<WeatherRecord> {
        let latitude: Option<f64> = row.get(3)?;
        let longitude: Option<f64> = row.get(4)?;
        let humidity: Option<i64> = row.get(7)?;
        let recorded_at_str: String = row.get(9)?;

        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(WeatherRecord {
            id: row.get(0)?,
            location: Location {
                city_name: row.get(1)?,
                country: row.get(2)?,
                coordinates: match (latitude, longitude) {
                    (Some(latitude), Some(longitude)) => Some(Coordinates { latitude, longitude }),
                    _ => None,
                },
            },
            weather_info: WeatherInfo {
                temperature: row.get(5)?,
                weather_description: row.get(6)?,
                humidity: humidity.and_then(|h| u8::try_from(h).ok()),
                wind_speed: row.get(8)?,
            },
            recorded_at,
        })
    }
}

impl WeatherStore for SqliteWeatherStore {
    fn insert(&self, record: &WeatherRecord) -> Result<i64, PersistenceError> {
        let location = &record.location;
        let info = &record.weather_info;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO weather_records
                (city_name, country, latitude, longitude, temperature,
                 weather_description, humidity, wind_speed, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                location.city_name,
                location.country,
                location.coordinates.map(|c| c.latitude),
                location.coordinates.map(|c| c.longitude),
                info.temperature,
                info.weather_description,
                info.humidity,
                info.wind_speed,
                record.recorded_at.to_rfc3339(),
            ],
        )
        .map_err(|e| PersistenceError::WriteFailure(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query_latest_by_city(&self, city: &str) -> Result<Option<WeatherRecord>, PersistenceError> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, city_name, country, latitude, longitude, temperature,
                        weather_description, humidity, wind_speed, recorded_at
                 FROM weather_records
                 WHERE city_name = ?1 COLLATE NOCASE
                 ORDER BY id DESC
                 LIMIT 1",
                params![city.trim()],
                Self::row_to_record,
            )
            .optional()
            .map_err(|e| PersistenceError::ReadFailure(e.to_string()))
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM weather_records", [], |row| row.get(0))
            .map_err(|e| PersistenceError::ReadFailure(e.to_string()))?;
        Ok(count as usize)
    }
}
