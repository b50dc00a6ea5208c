//! Polling offset value object
//!
//! The forecast step handed to the weather provider unchanged. With the
//! Open-Meteo provider it is the spacing between forecast entries in hours.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::PollingOffset;
//!
//! assert_eq!(PollingOffset::default().hours(), 1);
//! assert_eq!(PollingOffset::new(3).expect("valid offset").hours(), 3);
//! assert!(PollingOffset::new(0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a polling offset is zero
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid polling offset: {0} (must be at least 1)")]
pub struct InvalidPollingOffset(u8);

/// Forecast step passed through to the provider (defaults to 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PollingOffset(u8);

impl PollingOffset {
    /// Offset used when configuration does not supply one
    pub const DEFAULT: Self = Self(1);

    /// Create a new validated offset
    ///
    /// # Errors
    ///
    /// Returns `InvalidPollingOffset` if the value is zero.
    pub const fn new(value: u8) -> Result<Self, InvalidPollingOffset> {
        if value == 0 {
            Err(InvalidPollingOffset(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Resolve an optional configured value, falling back to the default
    ///
    /// # Errors
    ///
    /// Returns `InvalidPollingOffset` if a value is present and zero.
    pub fn from_option(value: Option<u8>) -> Result<Self, InvalidPollingOffset> {
        value.map_or(Ok(Self::DEFAULT), Self::new)
    }

    /// Offset value in provider units (hours)
    #[must_use]
    pub const fn hours(self) -> u8 {
        self.0
    }
}

impl Default for PollingOffset {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PollingOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

impl TryFrom<u8> for PollingOffset {
    type Error = InvalidPollingOffset;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PollingOffset> for u8 {
    fn from(offset: PollingOffset) -> Self {
        offset.0
    }
}

impl<'de> Deserialize<'de> for PollingOffset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u8::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one() {
        assert_eq!(PollingOffset::default().hours(), 1);
        assert_eq!(PollingOffset::DEFAULT, PollingOffset::default());
    }

    #[test]
    fn zero_is_rejected() {
        let result = PollingOffset::new(0);
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid polling offset: 0 (must be at least 1)"
        );
    }

    #[test]
    fn from_option_falls_back_to_default() {
        assert_eq!(PollingOffset::from_option(None).unwrap().hours(), 1);
        assert_eq!(PollingOffset::from_option(Some(6)).unwrap().hours(), 6);
        assert!(PollingOffset::from_option(Some(0)).is_err());
    }

    #[test]
    fn display_shows_hours() {
        assert_eq!(PollingOffset::new(3).unwrap().to_string(), "3h");
    }

    #[test]
    fn deserialize_validates() {
        let offset: PollingOffset = serde_json::from_str("12").expect("deserialize");
        assert_eq!(offset.hours(), 12);
        assert!(serde_json::from_str::<PollingOffset>("0").is_err());
    }
}
