//! Success response bodies

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Returned when a batch has been stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchAcceptedResponse {
    #[schema(example = "Successfully recorded 1 locations")]
    pub message: String,
    /// Number of samples stored
    #[schema(example = 1)]
    pub received_count: usize,
}

impl BatchAcceptedResponse {
    pub fn new(received_count: usize) -> Self {
        Self {
            message: format!("Successfully recorded {} locations", received_count),
            received_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Service liveness report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Instant the check was evaluated (ISO 8601)
    #[schema(example = "2024-01-15T10:30:00.000Z")]
    pub timestamp: String,
}
