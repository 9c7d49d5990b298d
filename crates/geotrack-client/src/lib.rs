//! Device-side pipeline: location fixes in, batches out to the ingestion API

pub mod api;
pub mod config;
pub mod mapper;
pub mod tracker;
pub mod uploader;

pub use api::{ApiClient, ApiError, BatchSink};
pub use config::ClientConfig;
pub use mapper::{LocationDataMapper, LocationFix};
pub use tracker::{AuthorizationStatus, LocationTracker, TrackerError, TrackerEvent};
pub use uploader::{BatchUploader, DeliveryLogEntry, DeliveryStatus};

pub use geotrack_types::{HealthResponse, HealthStatus};
