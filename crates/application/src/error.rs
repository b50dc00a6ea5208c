//! Application-level errors

use std::time::Duration;

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// External service error (provider unreachable, rejected or failing)
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Operation not valid for the given input
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation did not complete within its time bound
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is likely to clear up on a later attempt
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ExternalService(_) | Self::Timeout(_)
        )
    }
}

/// The single failure kind a weather refresh reports
///
/// Provider errors and timeouts are collapsed into this type; the original
/// cause stays available through [`UpdateFailed::cause`] and
/// [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("Update failed: {source}")]
pub struct UpdateFailed {
    source: ApplicationError,
}

impl UpdateFailed {
    /// Wrap the error that made the refresh fail
    pub const fn new(source: ApplicationError) -> Self {
        Self { source }
    }

    /// The underlying cause
    pub const fn cause(&self) -> &ApplicationError {
        &self.source
    }

    /// Whether the refresh ran out of time
    pub const fn is_timeout(&self) -> bool {
        matches!(self.source, ApplicationError::Timeout(_))
    }
}

impl From<ApplicationError> for UpdateFailed {
    fn from(source: ApplicationError) -> Self {
        Self::new(source)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(ApplicationError::RateLimited.is_retryable());
        assert!(ApplicationError::ExternalService("down".into()).is_retryable());
        assert!(ApplicationError::Timeout(Duration::from_secs(10)).is_retryable());
        assert!(!ApplicationError::InvalidOperation("bad".into()).is_retryable());
    }

    #[test]
    fn update_failed_keeps_cause() {
        let err = UpdateFailed::new(ApplicationError::ExternalService("HTTP 503".into()));
        assert_eq!(
            err.to_string(),
            "Update failed: External service error: HTTP 503"
        );
        assert!(err.source().is_some());
        assert!(!err.is_timeout());
    }

    #[test]
    fn update_failed_timeout() {
        let err: UpdateFailed = ApplicationError::Timeout(Duration::from_secs(10)).into();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out after 10s"));
    }
}
