//! Per-location configuration entries

use application::services::LocationEntry;
use domain::{
    DomainError,
    value_objects::{GeoLocation, PollingOffset},
};
use serde::{Deserialize, Serialize};

/// One `[[locations]]` table
///
/// ```toml
/// [[locations]]
/// name = "Helsinki"
/// latitude = 60.17
/// longitude = 24.94
/// offset = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Registration key; defaults to the coordinates' unique id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display name
    #[serde(default = "default_location_name")]
    pub name: String,

    /// Latitude (-90.0 to 90.0)
    pub latitude: f64,

    /// Longitude (-180.0 to 180.0)
    pub longitude: f64,

    /// Forecast offset in hours (default 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u8>,
}

fn default_location_name() -> String {
    "Weather".to_string()
}

impl LocationConfig {
    /// Validate into a registry entry
    pub fn to_entry(&self) -> Result<LocationEntry, DomainError> {
        let location = GeoLocation::new(self.latitude, self.longitude)?;
        let offset = PollingOffset::from_option(self.offset)?;
        let entry = LocationEntry::new(self.name.clone(), location, offset);
        Ok(match &self.id {
            Some(id) => entry.with_entry_id(id.clone()),
            None => entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn helsinki() -> LocationConfig {
        LocationConfig {
            id: None,
            name: "Helsinki".into(),
            latitude: 60.17,
            longitude: 24.94,
            offset: None,
        }
    }

    #[test]
    fn offset_defaults_to_one() {
        let entry = helsinki().to_entry().unwrap();
        assert_eq!(entry.offset.hours(), 1);
        assert_eq!(entry.entry_id, "60.17_24.94");
    }

    #[test]
    fn configured_offset_and_id_are_kept() {
        let config = LocationConfig {
            id: Some("home".into()),
            offset: Some(3),
            ..helsinki()
        };
        let entry = config.to_entry().unwrap();
        assert_eq!(entry.offset.hours(), 3);
        assert_eq!(entry.entry_id, "home");
        assert_eq!(entry.location.unique_id(), "60.17_24.94");
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let config = LocationConfig {
            latitude: 91.0,
            ..helsinki()
        };
        assert!(matches!(
            config.to_entry(),
            Err(DomainError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn zero_offset_is_rejected() {
        let config = LocationConfig {
            offset: Some(0),
            ..helsinki()
        };
        assert!(matches!(
            config.to_entry(),
            Err(DomainError::InvalidPollingOffset(_))
        ));
    }

    #[test]
    fn name_defaults_when_missing() {
        let parsed: LocationConfig =
            serde_json::from_str(r#"{"latitude": 60.0, "longitude": 25.0}"#).unwrap();
        assert_eq!(parsed.name, "Weather");
        assert_eq!(parsed.to_entry().unwrap().entry_id, "60.0_25.0");
    }
}
