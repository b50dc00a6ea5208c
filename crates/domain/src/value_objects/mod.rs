//! Value Objects - Immutable, identity-less domain primitives

mod geo_location;
mod polling_offset;

pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use polling_offset::{InvalidPollingOffset, PollingOffset};
