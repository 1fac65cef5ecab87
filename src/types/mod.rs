//! Core types for the overlay telemetry feed.
//!
//! - [`TelemetryField`] enumerates the simulator variables the overlays read,
//!   with both their feed names and their consumer-facing keys
//! - [`FieldValue`] is what a source hands back for one field
//! - [`UpdateRate`] controls how often a subscriber sees snapshots

mod field;
mod update_rate;
mod value;

pub use field::TelemetryField;
pub use update_rate::UpdateRate;
pub use value::FieldValue;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    proptest! {
        #[test]
        fn prop_integers_convert_losslessly(value in any::<i32>()) {
            let field = FieldValue::from(value);
            prop_assert_eq!(field.as_i32(), Some(value));
            prop_assert_eq!(field.as_f64(), Some(value as f64));
        }

        #[test]
        fn prop_fractional_floats_are_not_integers(whole in -1000i32..1000, frac in 0.01f64..0.99) {
            let field = FieldValue::Float(whole as f64 + frac);
            prop_assert_eq!(field.as_i32(), None);
            prop_assert!(field.as_f64().is_some());
        }

        #[test]
        fn prop_text_is_never_numeric(text in ".*") {
            let field = FieldValue::from(text.as_str());
            prop_assert_eq!(field.as_f64(), None);
            prop_assert_eq!(field.as_i32(), None);
            prop_assert_eq!(field.as_str(), Some(text.as_str()));
        }
    }

    #[test]
    fn whole_floats_and_bools_convert_to_integers() {
        assert_eq!(FieldValue::Float(3.0).as_i32(), Some(3));
        assert_eq!(FieldValue::Float(-1.0).as_i32(), Some(-1));
        assert_eq!(FieldValue::Bool(true).as_i32(), Some(1));
        assert_eq!(FieldValue::Int(i64::MAX).as_i32(), None);
        assert_eq!(FieldValue::Float(f64::NAN).as_i32(), None);
    }

    #[test]
    fn untagged_yaml_scalars_pick_the_natural_variant() {
        let values: Vec<FieldValue> =
            serde_yaml_ng::from_str("[true, 3, 4.5, Watkins Glen]").expect("valid yaml");
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Int(3),
                FieldValue::Float(4.5),
                FieldValue::Text("Watkins Glen".to_string()),
            ]
        );
    }

    #[test]
    fn field_names_round_trip_through_lookup() {
        for field in TelemetryField::VEHICLE.into_iter().chain(TelemetryField::SESSION) {
            assert_eq!(TelemetryField::from_sdk_name(field.sdk_name()), Some(field));
        }
        assert_eq!(TelemetryField::from_sdk_name("NotAField"), None);
        assert_eq!(TelemetryField::TireTempLf.sdk_name(), "LFtempCL");
        assert_eq!(TelemetryField::TireTempLf.key(), "tire_temp_LF");
    }

    #[test]
    fn update_rate_normalizes_against_poll_interval() {
        let poll = Duration::from_millis(50); // 20 Hz
        assert_eq!(UpdateRate::Max(10).normalize(poll), UpdateRate::Max(10));
        assert_eq!(UpdateRate::Max(20).normalize(poll), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(60).normalize(poll), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(0).normalize(poll), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(10).throttle_interval(poll), Some(Duration::from_millis(100)));
        assert_eq!(UpdateRate::Native.throttle_interval(poll), None);
    }
}
