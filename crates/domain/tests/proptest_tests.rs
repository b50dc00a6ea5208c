//! Property-based tests for domain value objects
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::value_objects::{GeoLocation, PollingOffset};
use proptest::prelude::*;

// ============================================================================
// GeoLocation Property Tests
// ============================================================================

mod geo_location_tests {
    use super::*;

    proptest! {
        #[test]
        fn valid_coordinates_create_location(
            lat in -90.0f64..=90.0f64,
            lon in -180.0f64..=180.0f64
        ) {
            let result = GeoLocation::new(lat, lon);
            prop_assert!(result.is_ok());

            let loc = result.unwrap();
            prop_assert!((loc.latitude() - lat).abs() < f64::EPSILON);
            prop_assert!((loc.longitude() - lon).abs() < f64::EPSILON);
        }

        #[test]
        fn invalid_latitude_rejected(
            lat in prop_oneof![
                (-1000.0f64..-90.1f64),
                (90.1f64..1000.0f64)
            ],
            lon in -180.0f64..=180.0f64
        ) {
            prop_assert!(GeoLocation::new(lat, lon).is_err());
        }

        #[test]
        fn invalid_longitude_rejected(
            lat in -90.0f64..=90.0f64,
            lon in prop_oneof![
                (-1000.0f64..-180.1f64),
                (180.1f64..1000.0f64)
            ]
        ) {
            prop_assert!(GeoLocation::new(lat, lon).is_err());
        }

        #[test]
        fn unique_id_joins_coordinates_with_underscore(
            lat in -90.0f64..=90.0f64,
            lon in -180.0f64..=180.0f64
        ) {
            let loc = GeoLocation::new(lat, lon).unwrap();
            let id = loc.unique_id();
            prop_assert_eq!(&id, &format!("{lat:?}_{lon:?}"));

            // Both halves parse back to the exact coordinates
            let (lat_part, lon_part) = id.split_once('_').unwrap();
            prop_assert_eq!(lat_part.parse::<f64>().unwrap().to_bits(), lat.to_bits());
            prop_assert_eq!(lon_part.parse::<f64>().unwrap().to_bits(), lon.to_bits());
        }
    }
}

// ============================================================================
// PollingOffset Property Tests
// ============================================================================

mod polling_offset_tests {
    use super::*;

    proptest! {
        #[test]
        fn non_zero_offsets_round_trip(value in 1u8..=u8::MAX) {
            let offset = PollingOffset::new(value).unwrap();
            prop_assert_eq!(offset.hours(), value);
            prop_assert_eq!(u8::from(offset), value);
        }

        #[test]
        fn configured_offset_wins_over_default(value in 1u8..=u8::MAX) {
            let offset = PollingOffset::from_option(Some(value)).unwrap();
            prop_assert_eq!(offset.hours(), value);
        }
    }
}
