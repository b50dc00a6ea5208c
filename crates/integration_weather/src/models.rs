//! Weather data models
//!
//! Types for representing weather data from Open-Meteo API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Weather condition derived from WMO weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    /// Clear sky (WMO 0)
    ClearSky,
    /// Mainly clear (WMO 1)
    MainlyClear,
    /// Partly cloudy (WMO 2)
    PartlyCloudy,
    /// Overcast (WMO 3)
    Overcast,
    /// Fog (WMO 45, 48)
    Fog,
    /// Drizzle (WMO 51, 53, 55)
    Drizzle,
    /// Freezing drizzle (WMO 56, 57)
    FreezingDrizzle,
    /// Rain (WMO 61, 63, 65)
    Rain,
    /// Freezing rain (WMO 66, 67)
    FreezingRain,
    /// Snow (WMO 71, 73, 75)
    Snow,
    /// Snow grains (WMO 77)
    SnowGrains,
    /// Rain showers (WMO 80, 81, 82)
    RainShowers,
    /// Snow showers (WMO 85, 86)
    SnowShowers,
    /// Thunderstorm (WMO 95)
    Thunderstorm,
    /// Thunderstorm with hail (WMO 96, 99)
    ThunderstormWithHail,
    /// Unknown condition
    Unknown,
}

impl WeatherCondition {
    /// Convert WMO weather code to `WeatherCondition`
    ///
    /// See: <https://open-meteo.com/en/docs> for WMO code reference
    #[must_use]
    pub const fn from_wmo_code(code: u8) -> Self {
        match code {
            0 => Self::ClearSky,
            1 => Self::MainlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::FreezingDrizzle,
            61 | 63 | 65 => Self::Rain,
            66 | 67 => Self::FreezingRain,
            71 | 73 | 75 => Self::Snow,
            77 => Self::SnowGrains,
            80..=82 => Self::RainShowers,
            85 | 86 => Self::SnowShowers,
            95 => Self::Thunderstorm,
            96 | 99 => Self::ThunderstormWithHail,
            _ => Self::Unknown,
        }
    }

    /// Get a human-readable description of the weather condition
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::MainlyClear => "Mainly clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::FreezingDrizzle => "Freezing drizzle",
            Self::Rain => "Rain",
            Self::FreezingRain => "Freezing rain",
            Self::Snow => "Snow",
            Self::SnowGrains => "Snow grains",
            Self::RainShowers => "Rain showers",
            Self::SnowShowers => "Snow showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::ThunderstormWithHail => "Thunderstorm with hail",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Current weather conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    /// Observation time
    pub time: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Apparent (feels like) temperature in Celsius
    pub apparent_temperature: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Weather condition
    pub condition: WeatherCondition,
    /// WMO weather code
    pub weather_code: u8,
    /// Wind speed in km/h
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360)
    pub wind_direction: u16,
    /// Wind gusts in km/h
    pub wind_gusts: f32,
    /// Precipitation in mm
    pub precipitation: f32,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: u8,
    /// Surface pressure in hPa
    pub pressure: f32,
}

/// One forecast entry of the stepped hourly series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    /// Forecast valid time
    pub time: DateTime<Utc>,
    /// Weather condition
    pub condition: WeatherCondition,
    /// WMO weather code
    pub weather_code: u8,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Precipitation in mm
    pub precipitation: f32,
    /// Wind speed in km/h
    pub wind_speed: f32,
    /// Wind direction in degrees (0-360)
    pub wind_direction: u16,
    /// Surface pressure in hPa
    pub pressure: f32,
}

/// Hourly forecast sampled every `time_step_hours`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Latitude of the grid cell the provider answered for
    pub latitude: f64,
    /// Longitude of the grid cell the provider answered for
    pub longitude: f64,
    /// Timezone of the location
    pub timezone: String,
    /// Timezone abbreviation
    pub timezone_abbreviation: String,
    /// Elevation in meters
    pub elevation: f32,
    /// Hours between consecutive entries
    pub time_step_hours: u8,
    /// Forecast entries in chronological order
    pub entries: Vec<HourlyForecast>,
}

impl Forecast {
    /// First entry of the series
    #[must_use]
    pub fn next(&self) -> Option<&HourlyForecast> {
        self.entries.first()
    }
}

/// Raw weather data from API (current)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CurrentData {
    pub time: String,
    pub temperature_2m: f32,
    pub relative_humidity_2m: u8,
    pub apparent_temperature: f32,
    pub weather_code: u8,
    pub wind_speed_10m: f32,
    pub wind_direction_10m: u16,
    pub wind_gusts_10m: f32,
    pub precipitation: f32,
    pub cloud_cover: u8,
    pub surface_pressure: f32,
}

/// Raw hourly data from API (column-oriented)
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HourlyData {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f32>,
    pub relative_humidity_2m: Vec<u8>,
    pub weather_code: Vec<u8>,
    pub precipitation: Vec<f32>,
    pub wind_speed_10m: Vec<f32>,
    pub wind_direction_10m: Vec<u16>,
    pub surface_pressure: Vec<f32>,
}

/// Raw API response
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub elevation: f32,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub current: Option<CurrentData>,
    pub hourly: Option<HourlyData>,
}
