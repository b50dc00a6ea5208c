//! Domain layer for the weather poller
//!
//! Contains the value objects that describe a polled location and the
//! domain errors raised when they are constructed from untrusted input.

pub mod errors;
pub mod value_objects;

pub use errors::DomainError;
pub use value_objects::*;
