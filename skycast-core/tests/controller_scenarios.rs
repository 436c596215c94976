//! End-to-end behavior of WeatherController against stub providers and stores.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use skycast_core::{
    FetchDefaults, ForecastEntry, Location, PersistenceError, ProviderError, SqliteWeatherStore,
    WeatherController, WeatherData, WeatherInfo, WeatherProvider, WeatherRecord, WeatherStore,
    WeatherUiState, WeatherUseCases,
};
use tokio::sync::watch;

fn weather(city: &str, country: &str, temperature: f64, days: usize) -> WeatherData {
    let info = WeatherInfo {
        temperature,
        weather_description: Some("Cloudy".to_string()),
        humidity: Some(80),
        wind_speed: Some(3.2),
    };
    let start = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();

    WeatherData {
        location: Location {
            city_name: Some(city.to_string()),
            country: country.to_string(),
            coordinates: None,
        },
        current: info.clone(),
        forecast: (0..days)
            .map(|i| ForecastEntry {
                date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                weather: info.clone(),
            })
            .collect(),
    }
}

/// One canned provider reply, delivered after `delay`.
struct Reply {
    delay: Duration,
    result: Result<f64, ProviderError>,
}

/// Provider that answers calls in order from a script.
#[derive(Debug, Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<(Duration, Result<f64, ProviderError>)>>,
    requests: Mutex<Vec<(String, String, u32)>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| (r.delay, r.result)).collect()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<(String, String, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedProvider {
    async fn fetch_weather(
        &self,
        city: &str,
        country: &str,
        days: u32,
    ) -> Result<WeatherData, ProviderError> {
        self.requests.lock().unwrap().push((city.to_string(), country.to_string(), days));
        let (delay, result) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("provider called more often than scripted");

        tokio::time::sleep(delay).await;
        result.map(|temperature| weather(city, country, temperature, days as usize))
    }
}

fn ok(temperature: f64) -> Reply {
    Reply { delay: Duration::ZERO, result: Ok(temperature) }
}

fn toronto_defaults() -> FetchDefaults {
    FetchDefaults { city: "Toronto".to_string(), country: "CA".to_string(), forecast_days: 7 }
}

fn controller_with(
    provider: Arc<ScriptedProvider>,
    store: Arc<dyn WeatherStore>,
) -> WeatherController {
    WeatherController::new(WeatherUseCases::new(provider, store), toronto_defaults())
}

fn success_temperature(state: &WeatherUiState) -> f64 {
    match state {
        WeatherUiState::Success(data) => data.current.temperature,
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn initial_state_is_loading() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let controller = controller_with(ScriptedProvider::new(vec![]), store);

    assert_eq!(controller.state(), WeatherUiState::Loading);
}

#[tokio::test]
async fn scenario_a_success_is_published_and_saved() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![ok(5.0)]);
    let controller = controller_with(provider.clone(), store.clone());

    let handle = controller.fetch_weather("Toronto", "CA");
    assert!(controller.state().is_loading());
    handle.await.unwrap();

    let WeatherUiState::Success(data) = controller.state() else {
        panic!("expected Success, got {:?}", controller.state());
    };
    assert_eq!(data.current.temperature, 5.0);
    assert_eq!(data.current.weather_description.as_deref(), Some("Cloudy"));
    assert_eq!(data.current.humidity, Some(80));
    assert_eq!(data.current.wind_speed, Some(3.2));
    assert_eq!(data.forecast.len(), 7);
    assert_eq!(provider.requests(), vec![("Toronto".to_string(), "CA".to_string(), 7)]);

    controller.wait_for_saves().await;
    assert_eq!(store.count().unwrap(), 1);
    let latest = store.query_latest_by_city("Toronto").unwrap().expect("saved record");
    assert_eq!(latest.location, data.location);
    assert_eq!(latest.weather_info, data.current);
}

#[tokio::test]
async fn scenario_b_not_found_publishes_error_without_saving() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![Reply {
        delay: Duration::ZERO,
        result: Err(ProviderError::NotFound {
            city: "Nowhere".to_string(),
            country: "ZZ".to_string(),
        }),
    }]);
    let controller = controller_with(provider, store.clone());

    controller.fetch_weather("Nowhere", "ZZ").await.unwrap();
    controller.wait_for_saves().await;

    match controller.state() {
        WeatherUiState::Error(message) => assert!(message.contains("Nowhere")),
        other => panic!("expected Error, got {other:?}"),
    }
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn scenario_c_last_completed_fetch_wins() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![
        Reply { delay: Duration::from_millis(200), result: Ok(1.0) },
        Reply { delay: Duration::from_millis(20), result: Ok(2.0) },
    ]);
    let controller = controller_with(provider, store.clone());
    let mut rx = controller.subscribe();

    let slow = controller.fetch_weather("Toronto", "CA");
    let fast = controller.fetch_weather("Toronto", "CA");

    fast.await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(success_temperature(&rx.borrow_and_update()), 2.0);

    slow.await.unwrap();
    // The slower, earlier request overwrites the newer result.
    assert_eq!(success_temperature(&controller.state()), 1.0);

    controller.wait_for_saves().await;
    assert_eq!(store.count().unwrap(), 2);
    let latest = store.query_latest_by_city("Toronto").unwrap().unwrap();
    assert_eq!(latest.weather_info.temperature, 1.0);
}

#[tokio::test]
async fn refetch_resets_to_loading() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let controller = controller_with(ScriptedProvider::new(vec![ok(5.0), ok(6.0)]), store);

    controller.fetch_weather("Toronto", "CA").await.unwrap();
    assert!(controller.state().is_settled());

    let handle = controller.fetch_weather("Toronto", "CA");
    assert_eq!(controller.state(), WeatherUiState::Loading);
    handle.await.unwrap();
    assert_eq!(success_temperature(&controller.state()), 6.0);
}

#[tokio::test]
async fn fetch_default_uses_injected_location() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![ok(5.0)]);
    let controller = WeatherController::new(
        WeatherUseCases::new(provider.clone(), store),
        FetchDefaults { city: "Oslo".to_string(), country: "NO".to_string(), forecast_days: 3 },
    );

    controller.fetch_default().await.unwrap();

    assert_eq!(provider.requests(), vec![("Oslo".to_string(), "NO".to_string(), 3)]);
    let WeatherUiState::Success(data) = controller.state() else {
        panic!("expected Success");
    };
    assert_eq!(data.forecast.len(), 3);
}

#[tokio::test]
async fn validation_error_skips_provider() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![]);
    let controller = controller_with(provider.clone(), store);

    controller.fetch_weather("   ", "CA").await.unwrap();

    assert_eq!(controller.state(), WeatherUiState::Error("Please enter a city name.".to_string()));
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn network_failure_is_human_readable() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let provider = ScriptedProvider::new(vec![Reply {
        delay: Duration::ZERO,
        result: Err(ProviderError::NetworkUnreachable("connection refused (os error 111)".into())),
    }]);
    let controller = controller_with(provider, store);

    controller.fetch_weather("Toronto", "CA").await.unwrap();

    match controller.state() {
        WeatherUiState::Error(message) => {
            assert!(message.contains("connection"));
            assert!(!message.contains("os error"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

/// Store whose writes always fail.
struct FailingStore;

impl WeatherStore for FailingStore {
    fn insert(&self, _record: &WeatherRecord) -> Result<i64, PersistenceError> {
        Err(PersistenceError::WriteFailure("disk full".to_string()))
    }

    fn query_latest_by_city(&self, _city: &str) -> Result<Option<WeatherRecord>, PersistenceError> {
        Ok(None)
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        Ok(0)
    }
}

#[tokio::test]
async fn save_failure_does_not_downgrade_success() {
    let controller = controller_with(ScriptedProvider::new(vec![ok(5.0)]), Arc::new(FailingStore));

    controller.fetch_weather("Toronto", "CA").await.unwrap();
    controller.wait_for_saves().await;

    assert_eq!(success_temperature(&controller.state()), 5.0);
    assert_eq!(controller.persistence_failures(), 1);
}

/// Store that records the controller state seen at each insert.
#[derive(Default)]
struct ObservingStore {
    state: OnceLock<watch::Receiver<WeatherUiState>>,
    seen: Mutex<Vec<WeatherUiState>>,
    inner: Mutex<Vec<WeatherRecord>>,
}

impl WeatherStore for ObservingStore {
    fn insert(&self, record: &WeatherRecord) -> Result<i64, PersistenceError> {
        if let Some(rx) = self.state.get() {
            self.seen.lock().unwrap().push(rx.borrow().clone());
        }
        let mut records = self.inner.lock().unwrap();
        records.push(record.clone());
        Ok(records.len() as i64)
    }

    fn query_latest_by_city(&self, _city: &str) -> Result<Option<WeatherRecord>, PersistenceError> {
        Ok(self.inner.lock().unwrap().last().cloned())
    }

    fn count(&self) -> Result<usize, PersistenceError> {
        Ok(self.inner.lock().unwrap().len())
    }
}

#[tokio::test]
async fn save_runs_after_success_is_published() {
    let store = Arc::new(ObservingStore::default());
    let controller = controller_with(ScriptedProvider::new(vec![ok(5.0)]), store.clone());
    store.state.set(controller.subscribe()).unwrap();

    controller.fetch_weather("Toronto", "CA").await.unwrap();
    controller.wait_for_saves().await;

    let seen = store.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(success_temperature(&seen[0]), 5.0);
}

#[tokio::test]
async fn each_successful_fetch_adds_exactly_one_record() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let controller =
        controller_with(ScriptedProvider::new(vec![ok(5.0), ok(5.0), ok(5.0)]), store.clone());

    for expected in 1..=3 {
        controller.fetch_weather("Toronto", "CA").await.unwrap();
        controller.wait_for_saves().await;
        assert_eq!(store.count().unwrap(), expected);
    }
}

#[tokio::test]
async fn finished_saves_are_released_without_waiting() {
    let store = Arc::new(SqliteWeatherStore::in_memory().unwrap());
    let replies = (0..51).map(|_| ok(5.0)).collect();
    let controller = controller_with(ScriptedProvider::new(replies), store.clone());

    for _ in 0..50 {
        controller.fetch_weather("Toronto", "CA").await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(store.count().unwrap(), 50);

    controller.fetch_weather("Toronto", "CA").await.unwrap();
    assert_eq!(controller.pending_save_count(), 1);

    controller.wait_for_saves().await;
    assert_eq!(controller.pending_save_count(), 0);
    assert_eq!(store.count().unwrap(), 51);
}
