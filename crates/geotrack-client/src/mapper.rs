//! Conversion from raw platform fixes to wire samples

use geotrack_core::{to_iso_timestamp, UtcDateTime};
use geotrack_types::{ActivityType, DeviceInfo, LocationBatch, LocationSample};

/// A position as reported by the platform location provider.
///
/// Negative speed or course and non-positive accuracy are the provider's
/// way of saying "not available".
#[derive(Debug, Clone, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy: f64,
    pub altitude: f64,
    pub speed: f64,
    pub course: f64,
    pub timestamp: UtcDateTime,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: UtcDateTime) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy: -1.0,
            altitude: 0.0,
            speed: -1.0,
            course: -1.0,
            timestamp,
        }
    }
}

pub struct LocationDataMapper {
    device_id: String,
    device_info: Option<DeviceInfo>,
    activity_type: ActivityType,
    battery_level: Option<f64>,
}

impl LocationDataMapper {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            device_info: None,
            activity_type: ActivityType::Unknown,
            battery_level: None,
        }
    }

    pub fn with_device_info(mut self, device_info: DeviceInfo) -> Self {
        self.device_info = Some(device_info);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn set_activity_type(&mut self, activity_type: ActivityType) {
        self.activity_type = activity_type;
    }

    pub fn set_battery_level(&mut self, battery_level: Option<f64>) {
        self.battery_level = battery_level;
    }

    pub fn map_fix(&self, fix: &LocationFix) -> LocationSample {
        LocationSample {
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp: to_iso_timestamp(&fix.timestamp),
            accuracy: (fix.horizontal_accuracy > 0.0).then_some(fix.horizontal_accuracy),
            altitude: Some(fix.altitude),
            speed: (fix.speed >= 0.0).then_some(fix.speed),
            heading: (fix.course >= 0.0).then_some(fix.course),
            battery_level: self.battery_level,
            activity_type: Some(self.activity_type),
        }
    }

    pub fn create_batch(&self, fixes: &[LocationFix]) -> LocationBatch {
        self.batch_from_samples(fixes.iter().map(|fix| self.map_fix(fix)).collect())
    }

    pub fn batch_from_samples(&self, locations: Vec<LocationSample>) -> LocationBatch {
        LocationBatch {
            device_id: self.device_id.clone(),
            device_info: self.device_info.clone(),
            locations,
        }
    }
}
