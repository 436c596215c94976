use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::controller::FetchDefaults;

pub const DEFAULT_CITY: &str = "Toronto";
pub const DEFAULT_COUNTRY: &str = "CA";
pub const DEFAULT_FORECAST_DAYS: u32 = 7;

/// Credentials and endpoint for the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,

    /// Override for the provider base URL, mostly useful against a local mock.
    pub base_url: Option<String>,
}

/// Location fetched when the user does not name one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocation {
    pub city: String,
    pub country: String,
    pub forecast_days: u32,
}

impl Default for DefaultLocation {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
///
/// [defaults]
/// city = "Toronto"
/// country = "CA"
/// forecast_days = 7
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub defaults: DefaultLocation,

    /// Optional override for the SQLite database location.
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Returns the configured API key, or an error with a hint on how to set it.
    pub fn api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured for the weather provider.\n\
                     Hint: run `skycast configure` and enter your Weatherbit API key."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    pub fn fetch_defaults(&self) -> FetchDefaults {
        FetchDefaults {
            city: self.defaults.city.clone(),
            country: self.defaults.country.clone(),
            forecast_days: self.defaults.forecast_days,
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the weather store lives: the configured override, else the
    /// platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        Ok(Self::project_dirs()?.data_dir().join("weather.db"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("net", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
