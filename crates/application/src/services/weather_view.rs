//! Weather view
//!
//! Flat read model of a coordinator's stored data, the shape a
//! dashboard or the CLI prints.

use serde::Serialize;

use crate::{
    ports::{ForecastEntry, WeatherCondition},
    services::weather_coordinator::WeatherCoordinator,
};

/// Data attribution shown alongside every view
pub const ATTRIBUTION: &str = "Weather data provided by Open-Meteo.com";

/// Unit of every temperature in the view
pub const TEMPERATURE_UNIT: &str = "°C";

/// Read model of one location's weather
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherView {
    /// Configured display name
    pub name: String,
    /// Identifier derived from the coordinates
    pub unique_id: String,
    /// Provider attribution
    pub attribution: &'static str,
    /// Whether current conditions have been fetched at least once
    pub available: bool,
    /// Current temperature
    pub temperature: Option<f64>,
    /// Unit of `temperature` and of forecast temperatures
    pub temperature_unit: &'static str,
    /// Relative humidity in percent
    pub humidity: Option<u8>,
    /// Precipitation in mm
    pub precipitation: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_bearing: Option<u16>,
    /// Surface pressure in hPa
    pub pressure: Option<f64>,
    /// Current condition
    pub condition: Option<WeatherCondition>,
    /// Forecast entries spaced by the polling offset
    pub forecast: Option<Vec<ForecastEntry>>,
}

impl WeatherView {
    /// Build the view from whatever the coordinator currently holds
    pub fn of(coordinator: &WeatherCoordinator) -> Self {
        let snapshot = coordinator.snapshot();
        let current = snapshot.as_ref().map(|s| &s.current);

        Self {
            name: coordinator.name().to_string(),
            unique_id: coordinator.unique_id().to_string(),
            attribution: ATTRIBUTION,
            available: current.is_some(),
            temperature: current.map(|c| c.temperature),
            temperature_unit: TEMPERATURE_UNIT,
            humidity: current.map(|c| c.humidity),
            precipitation: current.map(|c| c.precipitation),
            wind_speed: current.map(|c| c.wind_speed),
            wind_bearing: current.map(|c| c.wind_bearing),
            pressure: current.map(|c| c.pressure),
            condition: current.map(|c| c.condition),
            forecast: snapshot.as_ref().map(|s| s.forecast.entries.clone()),
        }
    }
}
