//! Location batch validation
//!
//! Checks run in a fixed order and stop at the first violation, so a client
//! always learns about exactly one problem per request. Validation works on
//! the decoded JSON tree rather than on typed structs: missing fields, wrong
//! JSON types and out-of-range values all need distinct messages, which
//! serde's own errors cannot express.

use geotrack_core::error_builder::invalid_request;
use geotrack_core::problemdetails::Problem;
use geotrack_types::{ActivityType, DeviceInfo, LocationBatch, LocationSample};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Which coordinate a violation refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn field(&self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    /// Inclusive bounds in degrees
    pub fn bounds(&self) -> (i32, i32) {
        match self {
            Axis::Latitude => (-90, 90),
            Axis::Longitude => (-180, 180),
        }
    }

    fn contains(&self, value: f64) -> bool {
        let (min, max) = self.bounds();
        value >= f64::from(min) && value <= f64::from(max)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// The first rule a batch broke
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("locations field is required and must be an array")]
    LocationsMissing,

    #[error("At least one location is required")]
    LocationsEmpty,

    #[error("device_id field is required")]
    DeviceIdMissing,

    #[error("{axis} is required and must be a number")]
    CoordinateMissing { index: usize, axis: Axis },

    #[error("timestamp is required")]
    TimestampMissing { index: usize },

    #[error("Invalid {axis} value")]
    CoordinateOutOfRange { index: usize, axis: Axis, actual: f64 },
}

impl ValidationFailure {
    /// Path of the offending field, e.g. `locations[2].longitude`
    pub fn field(&self) -> String {
        match self {
            ValidationFailure::LocationsMissing | ValidationFailure::LocationsEmpty => {
                "locations".to_string()
            }
            ValidationFailure::DeviceIdMissing => "device_id".to_string(),
            ValidationFailure::CoordinateMissing { index, axis }
            | ValidationFailure::CoordinateOutOfRange { index, axis, .. } => {
                element_field(*index, axis.field())
            }
            ValidationFailure::TimestampMissing { index } => element_field(*index, "timestamp"),
        }
    }

    /// Structured description of the violated constraint
    pub fn details(&self) -> Value {
        let field = self.field();
        match self {
            ValidationFailure::LocationsMissing => json!({"field": field, "type": "array"}),
            ValidationFailure::LocationsEmpty => json!({"field": field, "minItems": 1}),
            ValidationFailure::DeviceIdMissing | ValidationFailure::TimestampMissing { .. } => {
                json!({"field": field, "type": "string"})
            }
            ValidationFailure::CoordinateMissing { .. } => {
                json!({"field": field, "type": "number"})
            }
            ValidationFailure::CoordinateOutOfRange { axis, actual, .. } => {
                let (min, max) = axis.bounds();
                json!({"field": field, "min": min, "max": max, "actual": actual})
            }
        }
    }
}

impl From<ValidationFailure> for Problem {
    fn from(failure: ValidationFailure) -> Self {
        invalid_request()
            .message(failure.to_string())
            .details(failure.details())
            .build()
    }
}

fn element_field(index: usize, name: &str) -> String {
    format!("locations[{}].{}", index, name)
}

/// Validate a decoded request body and convert it into a typed batch.
pub fn validate_batch(payload: &Value) -> Result<LocationBatch, ValidationFailure> {
    let locations = payload
        .get("locations")
        .and_then(Value::as_array)
        .ok_or(ValidationFailure::LocationsMissing)?;

    if locations.is_empty() {
        return Err(ValidationFailure::LocationsEmpty);
    }

    let device_id = payload
        .get("device_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationFailure::DeviceIdMissing)?;

    let samples = locations
        .iter()
        .enumerate()
        .map(|(index, element)| validate_sample(index, element))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LocationBatch {
        device_id: device_id.to_string(),
        device_info: payload.get("device_info").and_then(device_info),
        locations: samples,
    })
}

fn validate_sample(index: usize, element: &Value) -> Result<LocationSample, ValidationFailure> {
    let latitude = coordinate(index, element, Axis::Latitude)?;
    let longitude = coordinate(index, element, Axis::Longitude)?;

    let timestamp = element
        .get("timestamp")
        .filter(|value| is_truthy(value))
        .ok_or(ValidationFailure::TimestampMissing { index })?;

    for (axis, actual) in [(Axis::Latitude, latitude), (Axis::Longitude, longitude)] {
        if !axis.contains(actual) {
            return Err(ValidationFailure::CoordinateOutOfRange {
                index,
                axis,
                actual,
            });
        }
    }

    let object = element.as_object();
    Ok(LocationSample {
        latitude,
        longitude,
        timestamp: match timestamp {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        },
        accuracy: optional_number(object, "accuracy"),
        altitude: optional_number(object, "altitude"),
        speed: optional_number(object, "speed"),
        heading: optional_number(object, "heading"),
        battery_level: optional_number(object, "battery_level"),
        activity_type: object
            .and_then(|o| o.get("activity_type"))
            .and_then(Value::as_str)
            .and_then(|name| name.parse::<ActivityType>().ok()),
    })
}

fn coordinate(index: usize, element: &Value, axis: Axis) -> Result<f64, ValidationFailure> {
    element
        .get(axis.field())
        .and_then(Value::as_f64)
        .ok_or(ValidationFailure::CoordinateMissing { index, axis })
}

fn optional_number(object: Option<&Map<String, Value>>, key: &str) -> Option<f64> {
    object.and_then(|o| o.get(key)).and_then(Value::as_f64)
}

fn device_info(value: &Value) -> Option<DeviceInfo> {
    serde_json::from_value(value.clone()).ok()
}

/// Presence check for required scalars: null, "", false and 0 count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> Value {
        json!({
            "device_id": "550e8400-e29b-41d4-a716-446655440000",
            "locations": [{
                "latitude": 35.6812,
                "longitude": 139.7671,
                "accuracy": 5.0,
                "timestamp": "2024-01-15T10:30:00Z"
            }]
        })
    }

    #[test]
    fn test_valid_batch() {
        let batch = validate_batch(&valid_payload()).unwrap();
        assert_eq!(batch.device_id, "550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.locations[0].accuracy, Some(5.0));
        assert!(batch.device_info.is_none());
    }

    #[test]
    fn test_missing_locations() {
        let failure = validate_batch(&json!({"device_id": "abc"})).unwrap_err();
        assert_eq!(failure, ValidationFailure::LocationsMissing);
        assert_eq!(
            failure.to_string(),
            "locations field is required and must be an array"
        );
        assert_eq!(
            failure.details(),
            json!({"field": "locations", "type": "array"})
        );
    }

    #[test]
    fn test_locations_not_an_array() {
        let failure =
            validate_batch(&json!({"device_id": "abc", "locations": {"latitude": 1}})).unwrap_err();
        assert_eq!(failure, ValidationFailure::LocationsMissing);
    }

    #[test]
    fn test_non_object_body() {
        let failure = validate_batch(&json!([1, 2, 3])).unwrap_err();
        assert_eq!(failure, ValidationFailure::LocationsMissing);
    }

    #[test]
    fn test_empty_locations() {
        let failure = validate_batch(&json!({"device_id": "abc", "locations": []})).unwrap_err();
        assert_eq!(failure.to_string(), "At least one location is required");
        assert_eq!(failure.details(), json!({"field": "locations", "minItems": 1}));
    }

    #[test]
    fn test_empty_locations_reported_before_missing_device_id() {
        let failure = validate_batch(&json!({"locations": []})).unwrap_err();
        assert_eq!(failure, ValidationFailure::LocationsEmpty);
    }

    #[test]
    fn test_device_id_rejections() {
        for device_id in [Value::Null, json!(""), json!(42), json!({"id": "abc"})] {
            let mut payload = valid_payload();
            payload["device_id"] = device_id;
            let failure = validate_batch(&payload).unwrap_err();
            assert_eq!(failure, ValidationFailure::DeviceIdMissing);
            assert_eq!(
                failure.details(),
                json!({"field": "device_id", "type": "string"})
            );
        }

        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("device_id");
        assert_eq!(
            validate_batch(&payload).unwrap_err().to_string(),
            "device_id field is required"
        );
    }

    #[test]
    fn test_latitude_must_be_a_number() {
        let mut payload = valid_payload();
        payload["locations"][0]["latitude"] = json!("35.6");
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(failure.to_string(), "latitude is required and must be a number");
        assert_eq!(
            failure.details(),
            json!({"field": "locations[0].latitude", "type": "number"})
        );
    }

    #[test]
    fn test_longitude_missing() {
        let mut payload = valid_payload();
        payload["locations"][0]
            .as_object_mut()
            .unwrap()
            .remove("longitude");
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(
            failure,
            ValidationFailure::CoordinateMissing {
                index: 0,
                axis: Axis::Longitude
            }
        );
        assert_eq!(failure.to_string(), "longitude is required and must be a number");
    }

    #[test]
    fn test_timestamp_falsy_values() {
        for timestamp in [Value::Null, json!(""), json!(false), json!(0)] {
            let mut payload = valid_payload();
            payload["locations"][0]["timestamp"] = timestamp;
            let failure = validate_batch(&payload).unwrap_err();
            assert_eq!(failure.to_string(), "timestamp is required");
            assert_eq!(
                failure.details(),
                json!({"field": "locations[0].timestamp", "type": "string"})
            );
        }
    }

    #[test]
    fn test_timestamp_format_not_checked() {
        let mut payload = valid_payload();
        payload["locations"][0]["timestamp"] = json!("invalid-date");
        let batch = validate_batch(&payload).unwrap();
        assert_eq!(batch.locations[0].timestamp, "invalid-date");
    }

    #[test]
    fn test_non_string_timestamp_kept_as_json_text() {
        let mut payload = valid_payload();
        payload["locations"][0]["timestamp"] = json!(1705314600);
        let batch = validate_batch(&payload).unwrap();
        assert_eq!(batch.locations[0].timestamp, "1705314600");
    }

    #[test]
    fn test_latitude_out_of_range() {
        let mut payload = valid_payload();
        payload["locations"][0]["latitude"] = json!(91.0);
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(failure.to_string(), "Invalid latitude value");
        let details = failure.details();
        assert_eq!(details["field"], "locations[0].latitude");
        assert_eq!(details["min"], -90);
        assert_eq!(details["max"], 90);
        assert_eq!(details["actual"], 91.0);
    }

    #[test]
    fn test_longitude_out_of_range() {
        let mut payload = valid_payload();
        payload["locations"][0]["longitude"] = json!(-181.0);
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(failure.to_string(), "Invalid longitude value");
        assert_eq!(failure.details()["min"], -180);
        assert_eq!(failure.details()["actual"], -181.0);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let payload = json!({
            "device_id": "abc",
            "locations": [
                {"latitude": 90, "longitude": 180, "timestamp": "t"},
                {"latitude": -90, "longitude": -180, "timestamp": "t"}
            ]
        });
        assert_eq!(validate_batch(&payload).unwrap().len(), 2);
    }

    #[test]
    fn test_presence_checked_before_range() {
        // latitude is out of range, but the missing timestamp wins
        let payload = json!({
            "device_id": "abc",
            "locations": [{"latitude": 100, "longitude": 0}]
        });
        assert_eq!(
            validate_batch(&payload).unwrap_err(),
            ValidationFailure::TimestampMissing { index: 0 }
        );
    }

    #[test]
    fn test_elements_checked_in_order() {
        let payload = json!({
            "device_id": "abc",
            "locations": [
                {"latitude": 10, "longitude": 200, "timestamp": "t"},
                {"longitude": 0, "timestamp": "t"}
            ]
        });
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(failure.field(), "locations[0].longitude");

        let payload = json!({
            "device_id": "abc",
            "locations": [
                {"latitude": 10, "longitude": 20, "timestamp": "t"},
                {"longitude": 0, "timestamp": "t"}
            ]
        });
        let failure = validate_batch(&payload).unwrap_err();
        assert_eq!(failure.field(), "locations[1].latitude");
    }

    #[test]
    fn test_lenient_optionals() {
        let payload = json!({
            "device_id": "abc",
            "device_info": {"model": "iPhone14,2", "os_version": "iOS 17.0"},
            "locations": [{
                "latitude": 1.0,
                "longitude": 2.0,
                "timestamp": "2024-01-15T10:30:00Z",
                "accuracy": "high",
                "speed": 3.5,
                "battery_level": 0.5,
                "activity_type": "teleporting"
            }]
        });
        let batch = validate_batch(&payload).unwrap();
        let sample = &batch.locations[0];
        assert_eq!(sample.accuracy, None);
        assert_eq!(sample.speed, Some(3.5));
        assert_eq!(sample.battery_level, Some(0.5));
        assert_eq!(sample.activity_type, None);
        assert_eq!(batch.device_info.unwrap().model, "iPhone14,2");
    }

    #[test]
    fn test_validation_is_repeatable() {
        let mut payload = valid_payload();
        payload["locations"][0]["latitude"] = json!(-95.5);
        assert_eq!(validate_batch(&payload), validate_batch(&payload));
        assert_eq!(validate_batch(&valid_payload()), validate_batch(&valid_payload()));
    }

    #[test]
    fn test_failure_into_problem() {
        let problem: Problem = ValidationFailure::LocationsEmpty.into();
        assert_eq!(problem.status_code, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(problem.error_code(), Some("INVALID_REQUEST"));
        assert_eq!(problem.message(), Some("At least one location is required"));
        assert_eq!(problem.body["details"]["minItems"], 1);
    }
}
