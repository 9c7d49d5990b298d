//! Location batch types
//!
//! A `LocationBatch` is what a device submits in one request: its identifier,
//! optional hardware information and one or more `LocationSample` readings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// What the device was doing when the sample was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Unknown,
    Stationary,
    Walking,
    Running,
    Automotive,
    Cycling,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Unknown => "unknown",
            ActivityType::Stationary => "stationary",
            ActivityType::Walking => "walking",
            ActivityType::Running => "running",
            ActivityType::Automotive => "automotive",
            ActivityType::Cycling => "cycling",
        }
    }

    pub fn all() -> [ActivityType; 6] {
        [
            ActivityType::Unknown,
            ActivityType::Stationary,
            ActivityType::Walking,
            ActivityType::Running,
            ActivityType::Automotive,
            ActivityType::Cycling,
        ]
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown activity type: {0}")]
pub struct ParseActivityTypeError(pub String);

impl FromStr for ActivityType {
    type Err = ParseActivityTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::all()
            .into_iter()
            .find(|activity| activity.as_str() == s)
            .ok_or_else(|| ParseActivityTypeError(s.to_string()))
    }
}

/// Hardware information reported alongside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeviceInfo {
    /// Hardware model identifier
    #[schema(example = "iPhone14,2")]
    pub model: String,
    /// Operating system name and version
    #[schema(example = "iOS 17.0")]
    pub os_version: String,
}

/// A single geolocation reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationSample {
    /// Latitude in degrees, -90 to 90
    #[schema(example = 35.6812)]
    pub latitude: f64,
    /// Longitude in degrees, -180 to 180
    #[schema(example = 139.7671)]
    pub longitude: f64,
    /// When the reading was taken (ISO 8601)
    #[schema(example = "2024-01-15T10:30:00Z")]
    pub timestamp: String,
    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 5.0)]
    pub accuracy: Option<f64>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 45.2)]
    pub altitude: Option<f64>,
    /// Speed in meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 1.5)]
    pub speed: Option<f64>,
    /// Course over ground in degrees
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 180.0)]
    pub heading: Option<f64>,
    /// Battery level, 0.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = 0.85)]
    pub battery_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
}

impl LocationSample {
    /// A sample carrying only the required fields
    pub fn new(latitude: f64, longitude: f64, timestamp: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: timestamp.into(),
            accuracy: None,
            altitude: None,
            speed: None,
            heading: None,
            battery_level: None,
            activity_type: None,
        }
    }
}

/// One client submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LocationBatch {
    /// Opaque device identifier (a UUID in practice)
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
    /// Readings in the order they were taken
    #[schema(min_items = 1)]
    pub locations: Vec<LocationSample>,
}

impl LocationBatch {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
