//! Weather service port
//!
//! Defines the interface for weather data retrieval. The refresh
//! coordinator stores whatever the port returns without looking inside.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::value_objects::{GeoLocation, PollingOffset};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Apparent/feels-like temperature in Celsius
    pub apparent_temperature: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: u8,
    /// Precipitation in mm
    pub precipitation: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind bearing in degrees (0-360)
    pub wind_bearing: u16,
    /// Surface pressure in hPa
    pub pressure: f64,
    /// Weather condition
    pub condition: WeatherCondition,
    /// When this data was observed
    pub observed_at: DateTime<Utc>,
}

/// One step of a forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Forecast valid time
    pub time: DateTime<Utc>,
    /// Weather condition
    pub condition: WeatherCondition,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Precipitation in mm
    pub precipitation: f64,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind bearing in degrees (0-360)
    pub wind_bearing: u16,
    /// Surface pressure in hPa
    pub pressure: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: u8,
}

/// Forecast series returned for a location and polling offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Offset the forecast was requested with
    pub offset: PollingOffset,
    /// Entries in chronological order
    pub entries: Vec<ForecastEntry>,
}

/// Weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    /// Clear sky
    ClearSky,
    /// Partly cloudy
    PartlyCloudy,
    /// Overcast
    Cloudy,
    /// Foggy
    Fog,
    /// Drizzle or light rain
    Rainy,
    /// Heavy rain or showers
    Pouring,
    /// Freezing rain or drizzle
    SnowyRainy,
    /// Snow
    Snowy,
    /// Thunderstorm
    LightningRainy,
    /// Unknown condition
    Unknown,
}

impl WeatherCondition {
    /// Get a human-readable description
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Foggy",
            Self::Rainy => "Rainy",
            Self::Pouring => "Pouring",
            Self::SnowyRainy => "Sleet",
            Self::Snowy => "Snowy",
            Self::LightningRainy => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Port for weather service operations
#[allow(clippy::struct_field_names)] // automock generates struct with `get_*` prefixes
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherPort: Send + Sync {
    /// Fetch current conditions for a location
    async fn get_current_weather(
        &self,
        location: &GeoLocation,
    ) -> Result<CurrentWeather, ApplicationError>;

    /// Fetch a forecast for a location; `offset` is passed to the provider
    /// unchanged
    async fn get_forecast(
        &self,
        location: &GeoLocation,
        offset: PollingOffset,
    ) -> Result<Forecast, ApplicationError>;

    /// Check if the weather service is available
    async fn is_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn WeatherPort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WeatherPort>();
    }

    #[test]
    fn weather_condition_display() {
        assert_eq!(WeatherCondition::ClearSky.to_string(), "Clear sky");
        assert_eq!(WeatherCondition::LightningRainy.description(), "Thunderstorm");
    }

    #[test]
    fn weather_condition_serializes_snake_case() {
        let json = serde_json::to_string(&WeatherCondition::SnowyRainy).unwrap();
        assert_eq!(json, "\"snowy_rainy\"");
    }
}
