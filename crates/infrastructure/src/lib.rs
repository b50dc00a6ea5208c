//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the Open-Meteo
//! weather adapter and the fixed-interval job scheduler. Also owns
//! configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod scheduler;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    AppConfig, ConfigError, CoordinatorAppConfig, LocationConfig, WeatherAppConfig,
};
pub use scheduler::{IntervalScheduler, IntervalTaskHandle, SchedulerError, TaskStats, TaskStatus};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
