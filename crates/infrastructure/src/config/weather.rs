//! Provider and refresh-cycle configuration

use std::time::Duration;

use application::services::CoordinatorSettings;
use integration_weather::WeatherConfig;
use serde::{Deserialize, Serialize};

/// Open-Meteo provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAppConfig {
    /// Open-Meteo API base URL
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,

    /// Per-request transport timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_secs: u64,

    /// Number of days the hourly forecast covers (1-16)
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

fn default_weather_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

const fn default_weather_timeout() -> u64 {
    30
}

const fn default_forecast_days() -> u8 {
    2
}

impl Default for WeatherAppConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            timeout_secs: default_weather_timeout(),
            forecast_days: default_forecast_days(),
        }
    }
}

impl From<&WeatherAppConfig> for WeatherConfig {
    fn from(config: &WeatherAppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_secs: config.timeout_secs,
            forecast_days: config.forecast_days,
        }
    }
}

/// Refresh cycle configuration shared by all locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorAppConfig {
    /// Minutes between scheduled refreshes
    #[serde(default = "default_update_interval_minutes")]
    pub update_interval_minutes: u64,

    /// Upper bound on one refresh (both provider calls) in seconds
    #[serde(default = "default_refresh_timeout_secs")]
    pub refresh_timeout_secs: u64,
}

const fn default_update_interval_minutes() -> u64 {
    30
}

const fn default_refresh_timeout_secs() -> u64 {
    10
}

impl Default for CoordinatorAppConfig {
    fn default() -> Self {
        Self {
            update_interval_minutes: default_update_interval_minutes(),
            refresh_timeout_secs: default_refresh_timeout_secs(),
        }
    }
}

impl CoordinatorAppConfig {
    /// Settings handed to the location registry
    #[must_use]
    pub const fn to_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            update_interval: Duration::from_secs(self.update_interval_minutes * 60),
            refresh_timeout: Duration::from_secs(self.refresh_timeout_secs),
        }
    }
}
