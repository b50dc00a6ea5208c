//! Domain-level errors

use thiserror::Error;

use crate::value_objects::{InvalidCoordinates, InvalidPollingOffset};

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Coordinates outside the valid range
    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    /// Polling offset outside the valid range
    #[error(transparent)]
    InvalidPollingOffset(#[from] InvalidPollingOffset),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{GeoLocation, PollingOffset};

    #[test]
    fn invalid_coordinates_convert() {
        let err: DomainError = GeoLocation::new(100.0, 0.0).unwrap_err().into();
        assert!(matches!(err, DomainError::InvalidCoordinates(_)));
        assert!(err.to_string().contains("latitude must be -90 to 90"));
    }

    #[test]
    fn invalid_offset_converts() {
        let err: DomainError = PollingOffset::new(0).unwrap_err().into();
        assert!(matches!(err, DomainError::InvalidPollingOffset(_)));
    }

    #[test]
    fn validation_error_display() {
        let err = DomainError::ValidationError("name must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: name must not be empty");
    }
}
