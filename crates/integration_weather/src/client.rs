//! Open-Meteo weather client
//!
//! HTTP client for the Open-Meteo Weather API.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::{
    ApiResponse, CurrentData, CurrentWeather, Forecast, HourlyData, HourlyForecast,
    WeatherCondition,
};

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
                              weather_code,wind_speed_10m,wind_direction_10m,wind_gusts_10m,\
                              precipitation,cloud_cover,surface_pressure";

const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,precipitation,\
                             wind_speed_10m,wind_direction_10m,surface_pressure";

/// Weather client errors
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Connection to the weather service failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request rejected by the weather service (4xx) or could not be sent
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse response from weather service
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid coordinates provided
    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    /// Service is temporarily unavailable (5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl WeatherError {
    /// Whether the provider blamed the request rather than itself
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::InvalidCoordinates | Self::RateLimitExceeded
        )
    }

    /// Whether the provider (or the path to it) failed
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::ServiceUnavailable(_) | Self::ParseError(_)
        )
    }
}

/// Weather service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo API base URL (default: <https://api.open-meteo.com/v1>)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request transport timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Number of days the hourly forecast covers (1-16, default: 2)
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,
}

fn default_base_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

const fn default_timeout() -> u64 {
    30
}

const fn default_forecast_days() -> u8 {
    2
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            forecast_days: default_forecast_days(),
        }
    }
}

/// Weather client trait for fetching weather data
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Get current weather for a location
    async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentWeather, WeatherError>;

    /// Get the hourly forecast for a location, keeping every
    /// `time_step_hours`-th hour
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        time_step_hours: u8,
    ) -> Result<Forecast, WeatherError>;

    /// Check if the weather service is healthy
    async fn is_healthy(&self) -> bool;
}

/// Open-Meteo HTTP client implementation
#[derive(Debug)]
pub struct OpenMeteoClient {
    client: Client,
    config: WeatherConfig,
}

impl OpenMeteoClient {
    /// Create a new Open-Meteo client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WeatherError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, WeatherError> {
        Self::new(WeatherConfig::default())
    }

    /// Validate coordinates
    fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinates);
        }
        Ok(())
    }

    /// Issue a `/forecast` request and decode the body
    async fn fetch(&self, query: &[(&str, String)]) -> Result<ApiResponse, WeatherError> {
        let url = format!("{}/forecast", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    WeatherError::ConnectionFailed(e.to_string())
                } else {
                    WeatherError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(WeatherError::RateLimitExceeded);
        }
        if status.is_server_error() {
            return Err(WeatherError::ServiceUnavailable(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(WeatherError::RequestFailed(format!("HTTP {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| WeatherError::ParseError(e.to_string()))
    }

    fn location_query(latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("timezone", "auto".to_string()),
        ]
    }

    /// Parse current weather from API response
    fn parse_current_weather(
        data: &CurrentData,
        utc_offset_seconds: i32,
    ) -> Result<CurrentWeather, WeatherError> {
        let time = Self::parse_datetime(&data.time, utc_offset_seconds)?;

        Ok(CurrentWeather {
            time,
            temperature: data.temperature_2m,
            apparent_temperature: data.apparent_temperature,
            humidity: data.relative_humidity_2m,
            condition: WeatherCondition::from_wmo_code(data.weather_code),
            weather_code: data.weather_code,
            wind_speed: data.wind_speed_10m,
            wind_direction: data.wind_direction_10m,
            wind_gusts: data.wind_gusts_10m,
            precipitation: data.precipitation,
            cloud_cover: data.cloud_cover,
            pressure: data.surface_pressure,
        })
    }

    /// Turn the column-oriented hourly block into entries, keeping every
    /// `step`-th hour starting with the first one
    fn parse_hourly_forecasts(
        hourly: &HourlyData,
        step: u8,
        utc_offset_seconds: i32,
    ) -> Result<Vec<HourlyForecast>, WeatherError> {
        let len = hourly.time.len();
        let columns = [
            hourly.temperature_2m.len(),
            hourly.relative_humidity_2m.len(),
            hourly.weather_code.len(),
            hourly.precipitation.len(),
            hourly.wind_speed_10m.len(),
            hourly.wind_direction_10m.len(),
            hourly.surface_pressure.len(),
        ];
        if columns.iter().any(|&n| n != len) {
            return Err(WeatherError::ParseError(format!(
                "Hourly columns have inconsistent lengths (time: {len}, others: {columns:?})"
            )));
        }

        (0..len)
            .step_by(usize::from(step.max(1)))
            .map(|i| {
                Ok(HourlyForecast {
                    time: Self::parse_datetime(&hourly.time[i], utc_offset_seconds)?,
                    condition: WeatherCondition::from_wmo_code(hourly.weather_code[i]),
                    weather_code: hourly.weather_code[i],
                    temperature: hourly.temperature_2m[i],
                    humidity: hourly.relative_humidity_2m[i],
                    precipitation: hourly.precipitation[i],
                    wind_speed: hourly.wind_speed_10m[i],
                    wind_direction: hourly.wind_direction_10m[i],
                    pressure: hourly.surface_pressure[i],
                })
            })
            .collect()
    }

    /// Parse a provider timestamp into `DateTime<Utc>`
    ///
    /// Open-Meteo reports local wall-clock times without an offset when
    /// `timezone=auto` is requested; the response's `utc_offset_seconds`
    /// maps them back to UTC. RFC 3339 input carries its own offset.
    fn parse_datetime(s: &str, utc_offset_seconds: i32) -> Result<DateTime<Utc>, WeatherError> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| WeatherError::ParseError(format!("Invalid datetime format: {s}")))?;

        let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            WeatherError::ParseError(format!("Invalid UTC offset: {utc_offset_seconds}"))
        })?;

        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| WeatherError::ParseError(format!("Ambiguous local time: {s}")))
    }
}

#[async_trait]
impl WeatherClient for OpenMeteoClient {
    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude))]
    async fn get_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<CurrentWeather, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;

        let mut query = Self::location_query(latitude, longitude);
        query.push(("current", CURRENT_FIELDS.to_string()));

        debug!("Fetching current weather");
        let api_response = self.fetch(&query).await?;

        let current_data = api_response.current.ok_or_else(|| {
            WeatherError::ParseError("No current weather data in response".to_string())
        })?;

        Self::parse_current_weather(&current_data, api_response.utc_offset_seconds)
    }

    #[instrument(skip(self), fields(lat = %latitude, lon = %longitude, step = %time_step_hours))]
    async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        time_step_hours: u8,
    ) -> Result<Forecast, WeatherError> {
        Self::validate_coordinates(latitude, longitude)?;

        let step = time_step_hours.max(1);
        let days = self.config.forecast_days.clamp(1, 16);

        let mut query = Self::location_query(latitude, longitude);
        query.push(("hourly", HOURLY_FIELDS.to_string()));
        query.push(("forecast_days", days.to_string()));

        debug!(days, "Fetching weather forecast");
        let api_response = self.fetch(&query).await?;

        let hourly = api_response.hourly.as_ref().ok_or_else(|| {
            WeatherError::ParseError("No hourly forecast data in response".to_string())
        })?;

        let entries = Self::parse_hourly_forecasts(hourly, step, api_response.utc_offset_seconds)?;
        debug!(entries = entries.len(), "Parsed hourly forecast");

        Ok(Forecast {
            latitude: api_response.latitude,
            longitude: api_response.longitude,
            timezone: api_response.timezone,
            timezone_abbreviation: api_response.timezone_abbreviation,
            elevation: api_response.elevation,
            time_step_hours: step,
            entries,
        })
    }

    async fn is_healthy(&self) -> bool {
        // Helsinki as a reference point
        self.get_current(60.17, 24.94).await.is_ok()
    }
}
