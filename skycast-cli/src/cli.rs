use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode, Text};
use skycast_core::{
    Config, MAX_FORECAST_DAYS, SqliteWeatherStore, WeatherController, WeatherStore,
    WeatherUiState, WeatherUseCases, provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "SkyCast weather")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the Weatherbit API key and the default location.
    Configure,

    /// Fetch current weather and forecast for a city.
    Show {
        /// City name; the configured default when absent.
        city: Option<String>,

        /// Country code, e.g. "CA".
        #[arg(long, short)]
        country: Option<String>,

        /// Print the final state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the most recently saved conditions for a city.
    Latest {
        city: String,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, country, json } => show(city, country, json).await,
            Command::Latest { city, json } => latest(&city, json).await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("Weatherbit API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    config.defaults.city = Text::new("Default city:")
        .with_default(&config.defaults.city)
        .prompt()
        .context("Failed to read default city")?;

    config.defaults.country = Text::new("Default country code:")
        .with_default(&config.defaults.country)
        .prompt()
        .context("Failed to read default country")?;

    config.defaults.forecast_days = CustomType::<u32>::new("Forecast days:")
        .with_default(config.defaults.forecast_days)
        .with_help_message(&format!("0 to {MAX_FORECAST_DAYS}"))
        .prompt()
        .context("Failed to read forecast days")?
        .min(MAX_FORECAST_DAYS);

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<SqliteWeatherStore> {
    let db_path = config.database_path()?;
    SqliteWeatherStore::open(&db_path)
        .with_context(|| format!("Failed to open weather store at {}", db_path.display()))
}

fn use_cases(config: &Config) -> anyhow::Result<WeatherUseCases> {
    let provider = provider_from_config(config)?;
    let store = open_store(config)?;

    Ok(WeatherUseCases::new(Arc::from(provider), Arc::new(store)))
}

async fn show(city: Option<String>, country: Option<String>, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let controller = WeatherController::new(use_cases(&config)?, config.fetch_defaults());
    let mut state = controller.subscribe();

    let defaults = controller.defaults();
    let city = city.unwrap_or_else(|| defaults.city.clone());
    let country = country.unwrap_or_else(|| defaults.country.clone());

    if !json {
        eprintln!("Fetching weather for {city}, {country}...");
    }
    let fetch = controller.fetch_weather(&city, &country);

    let settled = state
        .wait_for(WeatherUiState::is_settled)
        .await
        .context("Weather controller stopped before settling")?
        .clone();

    fetch.await.context("Weather fetch task failed")?;
    controller.wait_for_saves().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&settled)?);
    }

    match settled {
        WeatherUiState::Success(data) => {
            if !json {
                print!("{}", render::weather_data(&data));
            }
            Ok(())
        }
        WeatherUiState::Error(message) => bail!(message),
        WeatherUiState::Loading => bail!("Weather lookup did not finish"),
    }
}

async fn latest(city: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let city = city.trim().to_string();
    let record = tokio::task::spawn_blocking({
        let city = city.clone();
        move || store.query_latest_by_city(&city)
    })
    .await
    .context("Weather store lookup failed")??;

    let Some(record) = record else {
        bail!("No saved weather for \"{city}\". Run `skycast show {city}` first.");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print!("{}", render::weather_record(&record));
    }
    Ok(())
}
