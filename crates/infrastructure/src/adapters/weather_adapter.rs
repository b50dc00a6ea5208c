//! Weather adapter - Implements WeatherPort using integration_weather

use application::error::ApplicationError;
use application::ports::{CurrentWeather, Forecast, ForecastEntry, WeatherCondition, WeatherPort};
use async_trait::async_trait;
use domain::value_objects::{GeoLocation, PollingOffset};
use integration_weather::{
    CurrentWeather as IntegrationCurrent, HourlyForecast as IntegrationHourly, OpenMeteoClient,
    WeatherClient, WeatherCondition as IntegrationCondition, WeatherConfig, WeatherError,
};
use tracing::{debug, instrument};

/// Adapter for weather services using Open-Meteo API
pub struct WeatherAdapter {
    client: OpenMeteoClient,
}

impl std::fmt::Debug for WeatherAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherAdapter")
            .field("client", &"OpenMeteoClient")
            .finish()
    }
}

impl WeatherAdapter {
    /// Create a new adapter with default configuration
    pub fn new() -> Result<Self, ApplicationError> {
        let client = OpenMeteoClient::with_defaults().map_err(Self::map_error)?;
        Ok(Self { client })
    }

    /// Create with custom configuration
    pub fn with_config(config: WeatherConfig) -> Result<Self, ApplicationError> {
        let client = OpenMeteoClient::new(config).map_err(Self::map_error)?;
        Ok(Self { client })
    }

    /// Map integration weather error to application error
    fn map_error(err: WeatherError) -> ApplicationError {
        debug!(
            error = %err,
            client_error = err.is_client_error(),
            server_error = err.is_server_error(),
            "Weather provider call failed"
        );
        match err {
            WeatherError::ConnectionFailed(e)
            | WeatherError::RequestFailed(e)
            | WeatherError::ServiceUnavailable(e) => ApplicationError::ExternalService(e),
            WeatherError::ParseError(e) => ApplicationError::Internal(e),
            WeatherError::InvalidCoordinates => {
                ApplicationError::InvalidOperation("Invalid coordinates".into())
            },
            WeatherError::RateLimitExceeded => ApplicationError::RateLimited,
        }
    }

    /// Collapse WMO-derived conditions into the display set
    const fn map_condition(condition: IntegrationCondition) -> WeatherCondition {
        match condition {
            IntegrationCondition::ClearSky => WeatherCondition::ClearSky,
            IntegrationCondition::MainlyClear | IntegrationCondition::PartlyCloudy => {
                WeatherCondition::PartlyCloudy
            },
            IntegrationCondition::Overcast => WeatherCondition::Cloudy,
            IntegrationCondition::Fog => WeatherCondition::Fog,
            IntegrationCondition::Drizzle | IntegrationCondition::Rain => WeatherCondition::Rainy,
            IntegrationCondition::RainShowers => WeatherCondition::Pouring,
            IntegrationCondition::FreezingDrizzle | IntegrationCondition::FreezingRain => {
                WeatherCondition::SnowyRainy
            },
            IntegrationCondition::Snow
            | IntegrationCondition::SnowGrains
            | IntegrationCondition::SnowShowers => WeatherCondition::Snowy,
            IntegrationCondition::Thunderstorm | IntegrationCondition::ThunderstormWithHail => {
                WeatherCondition::LightningRainy
            },
            IntegrationCondition::Unknown => WeatherCondition::Unknown,
        }
    }

    fn map_current(current: &IntegrationCurrent) -> CurrentWeather {
        CurrentWeather {
            temperature: f64::from(current.temperature),
            apparent_temperature: f64::from(current.apparent_temperature),
            humidity: current.humidity,
            precipitation: f64::from(current.precipitation),
            wind_speed: f64::from(current.wind_speed),
            wind_bearing: current.wind_direction,
            pressure: f64::from(current.pressure),
            condition: Self::map_condition(current.condition),
            observed_at: current.time,
        }
    }

    fn map_hourly(hourly: &IntegrationHourly) -> ForecastEntry {
        ForecastEntry {
            time: hourly.time,
            condition: Self::map_condition(hourly.condition),
            temperature: f64::from(hourly.temperature),
            precipitation: f64::from(hourly.precipitation),
            wind_speed: f64::from(hourly.wind_speed),
            wind_bearing: hourly.wind_direction,
            pressure: f64::from(hourly.pressure),
            humidity: hourly.humidity,
        }
    }
}

#[async_trait]
impl WeatherPort for WeatherAdapter {
    #[instrument(skip(self), fields(lat = location.latitude(), lon = location.longitude()))]
    async fn get_current_weather(
        &self,
        location: &GeoLocation,
    ) -> Result<CurrentWeather, ApplicationError> {
        let result = self
            .client
            .get_current(location.latitude(), location.longitude())
            .await
            .map_err(Self::map_error);

        match &result {
            Ok(current) => {
                debug!(
                    temperature = current.temperature,
                    condition = %current.condition,
                    "Retrieved current weather"
                );
            },
            Err(e) => {
                debug!(error = %e, "Failed to get current weather");
            },
        }

        result.map(|c| Self::map_current(&c))
    }

    #[instrument(
        skip(self),
        fields(lat = location.latitude(), lon = location.longitude(), offset = offset.hours())
    )]
    async fn get_forecast(
        &self,
        location: &GeoLocation,
        offset: PollingOffset,
    ) -> Result<Forecast, ApplicationError> {
        let result = self
            .client
            .get_forecast(location.latitude(), location.longitude(), offset.hours())
            .await
            .map_err(Self::map_error);

        match &result {
            Ok(forecast) => {
                debug!(entries = forecast.entries.len(), "Retrieved weather forecast");
            },
            Err(e) => {
                debug!(error = %e, "Failed to get weather forecast");
            },
        }

        result.map(|f| Forecast {
            offset,
            entries: f.entries.iter().map(Self::map_hourly).collect(),
        })
    }

    #[instrument(skip(self))]
    async fn is_available(&self) -> bool {
        self.client.is_healthy().await
    }
}
