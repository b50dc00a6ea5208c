//! Application layer - Use cases and orchestration
//!
//! Holds the weather refresh coordinator, the registry that owns one
//! coordinator per configured location, and the ports they depend on.

pub mod error;
pub mod ports;
pub mod services;

pub use error::{ApplicationError, UpdateFailed};
pub use ports::*;
pub use services::*;
