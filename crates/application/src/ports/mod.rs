//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod scheduler_port;
mod weather_port;

pub use scheduler_port::{PeriodicTask, ScheduledTask, SchedulerPort, TaskFuture};
#[cfg(test)]
pub use weather_port::MockWeatherPort;
pub use weather_port::{CurrentWeather, Forecast, ForecastEntry, WeatherCondition, WeatherPort};
