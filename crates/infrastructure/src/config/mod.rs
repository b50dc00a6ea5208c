//! Application configuration
//!
//! Split into focused sub-modules:
//! - `weather`: Open-Meteo provider and refresh cycle settings
//! - `locations`: the `[[locations]]` entries
//!
//! Sources are layered: built-in defaults, then `config.toml` (or an
//! explicit path), then `WEATHER_POLLER_*` environment variables.

mod locations;
mod weather;

use std::path::Path;

use application::services::LocationEntry;
use domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::TelemetryConfig;

pub use locations::LocationConfig;
pub use weather::{CoordinatorAppConfig, WeatherAppConfig};

/// Environment variable prefix, e.g. `WEATHER_POLLER_COORDINATOR__REFRESH_TIMEOUT_SECS`
pub const ENV_PREFIX: &str = "WEATHER_POLLER";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A location entry has invalid values
    #[error("Invalid location '{name}': {source}")]
    InvalidLocation {
        /// Configured name of the entry
        name: String,
        /// What was wrong
        source: DomainError,
    },

    /// A setting is out of range
    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting {
        /// Dotted config key
        key: &'static str,
        /// What was wrong
        reason: String,
    },

    /// The effective configuration could not be rendered
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Open-Meteo provider configuration
    #[serde(default)]
    pub weather: WeatherAppConfig,

    /// Refresh cycle configuration
    #[serde(default)]
    pub coordinator: CoordinatorAppConfig,

    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Locations to poll
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit file (required) or the default
    /// `config.toml` (optional), then apply environment overrides
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path.to_path_buf())
                .format(config::FileFormat::Toml)
                .required(true),
            None => config::File::with_name("config")
                .format(config::FileFormat::Toml)
                .required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., WEATHER_POLLER_WEATHER__TIMEOUT_SECS)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde defaults cannot guard
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.coordinator.update_interval_minutes == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "coordinator.update_interval_minutes",
                reason: "must be greater than zero".into(),
            });
        }
        if self.coordinator.refresh_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "coordinator.refresh_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if !(1..=16).contains(&self.weather.forecast_days) {
            return Err(ConfigError::InvalidSetting {
                key: "weather.forecast_days",
                reason: format!("{} is outside 1-16", self.weather.forecast_days),
            });
        }
        Ok(())
    }

    /// Validate every location into a registry entry
    pub fn location_entries(&self) -> Result<Vec<LocationEntry>, ConfigError> {
        self.locations
            .iter()
            .map(|location| {
                location
                    .to_entry()
                    .map_err(|source| ConfigError::InvalidLocation {
                        name: location.name.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
