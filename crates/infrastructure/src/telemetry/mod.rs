//! Telemetry infrastructure
//!
//! Structured logging via `tracing-subscriber`.

mod logging;

pub use logging::{TelemetryConfig, TelemetryError, init_telemetry};
