//! Application services - Use case implementations

mod location_registry;
mod weather_coordinator;
mod weather_view;

pub use location_registry::{CoordinatorSettings, LocationEntry, LocationRegistry, RegistryError};
pub use weather_coordinator::{
    DEFAULT_REFRESH_TIMEOUT, DEFAULT_UPDATE_INTERVAL, RefreshStatus, WeatherCoordinator,
    WeatherSnapshot,
};
pub use weather_view::{ATTRIBUTION, TEMPERATURE_UNIT, WeatherView};
