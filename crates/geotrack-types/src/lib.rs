//! Wire types shared by the Geotrack server and client
//!
//! - **Location model**: `LocationBatch`, `LocationSample`, `DeviceInfo`, `ActivityType`
//! - **Responses**: `BatchAcceptedResponse`, `HealthResponse`
//!
//! Both sides of the HTTP contract depend on this crate so the JSON shape
//! has exactly one definition.

pub mod location;
pub mod response;

pub use location::{ActivityType, DeviceInfo, LocationBatch, LocationSample, ParseActivityTypeError};
pub use response::{BatchAcceptedResponse, HealthResponse, HealthStatus};
