//! HTTP client for the ingestion API

use async_trait::async_trait;
use geotrack_types::{HealthResponse, LocationBatch};
use reqwest::{Client, RequestBuilder, StatusCode};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ClientConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unexpected status code: {0}")]
    UnexpectedStatusCode(u16),

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("Invalid server URL {url}: {reason}")]
    InvalidServerUrl { url: String, reason: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Anything a batch can be handed to for delivery
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// `Ok(true)` when stored, `Ok(false)` when the server refused it.
    async fn send_location_batch(&self, batch: &LocationBatch) -> Result<bool, ApiError>;
}

pub struct ApiClient {
    config: ClientConfig,
    client: Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        url::Url::parse(&config.server_url).map_err(|e| ApiError::InvalidServerUrl {
            url: config.server_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder().timeout(config.timeout).build().map_err(|e| {
            error!("Failed to create HTTP client: {}", e);
            ApiError::Transport(e)
        })?;

        Ok(Self { config, client })
    }

    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.server_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.authorization_token {
            Some(ref token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// `true` on 200, `false` on 503.
    pub async fn check_health(&self) -> Result<bool, ApiError> {
        let response = self.client.get(self.endpoint("/health")).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::SERVICE_UNAVAILABLE => Ok(false),
            other => Err(ApiError::UnexpectedStatusCode(other.as_u16())),
        }
    }

    /// The decoded health body, healthy or not.
    pub async fn health_report(&self) -> Result<HealthResponse, ApiError> {
        let response = self.client.get(self.endpoint("/health")).send().await?;

        match response.status() {
            StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE => {
                response.json::<HealthResponse>().await.map_err(|e| {
                    warn!("Health response could not be decoded: {}", e);
                    ApiError::InvalidResponse
                })
            }
            other => Err(ApiError::UnexpectedStatusCode(other.as_u16())),
        }
    }
}

#[async_trait]
impl BatchSink for ApiClient {
    async fn send_location_batch(&self, batch: &LocationBatch) -> Result<bool, ApiError> {
        debug!(
            "Sending {} locations for device {} to {}",
            batch.len(),
            batch.device_id,
            self.config.server_url
        );

        let request = self
            .client
            .post(self.endpoint("/locations/batch"))
            .json(batch);
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("Location batch request failed: {}", e);
            ApiError::Transport(e)
        })?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => Ok(true),
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::INTERNAL_SERVER_ERROR => {
                warn!("Server refused location batch with {}", response.status());
                Ok(false)
            }
            other => Err(ApiError::UnexpectedStatusCode(other.as_u16())),
        }
    }
}
