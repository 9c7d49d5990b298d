//! HTTP surface: batch ingestion, health and the mounted router

use std::sync::Arc;

use axum::{
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use geotrack_core::{
    error_builder::{invalid_request, not_found, ErrorBuilder, INVALID_REQUEST},
    iso_timestamp_now, normalize_base_path,
    problemdetails::Problem,
    ErrorBody, IngestConfig, SuccessStatus,
};
use geotrack_types::{
    ActivityType, BatchAcceptedResponse, DeviceInfo, HealthResponse, HealthStatus, LocationBatch,
    LocationSample,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use utoipa::OpenApi;

use crate::auth::ApiKeyGuard;
use crate::store::LocationStore;
use crate::validator::validate_batch;

#[derive(OpenApi)]
#[openapi(
    paths(ingest_batch, health),
    components(schemas(
        LocationBatch,
        LocationSample,
        DeviceInfo,
        ActivityType,
        BatchAcceptedResponse,
        HealthResponse,
        HealthStatus,
        ErrorBody,
    )),
    servers((url = "/v1", description = "Default mount point")),
    tags(
        (name = "locations", description = "Location batch ingestion"),
        (name = "health", description = "Service liveness")
    )
)]
pub struct LocationsApiDoc;

pub struct LocationsAppState {
    pub store: Arc<dyn LocationStore>,
    pub config: IngestConfig,
}

impl LocationsAppState {
    pub fn new(store: Arc<dyn LocationStore>, config: IngestConfig) -> Self {
        Self { store, config }
    }
}

pub fn configure_routes() -> Router<Arc<LocationsAppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/locations/batch", post(ingest_batch))
}

/// The complete application: routes mounted under `base_path`, JSON 404s
/// for anything unmatched and request tracing.
pub fn build_router(state: Arc<LocationsAppState>, base_path: &str) -> Router {
    let base_path = normalize_base_path(base_path);
    let routes = configure_routes().method_not_allowed_fallback(endpoint_not_found);

    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    };

    app.fallback(endpoint_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn endpoint_not_found() -> Problem {
    not_found().build()
}

fn success_status_code(status: SuccessStatus) -> StatusCode {
    match status {
        SuccessStatus::Ok => StatusCode::OK,
        SuccessStatus::Created => StatusCode::CREATED,
    }
}

fn body_rejection(rejection: BytesRejection) -> Problem {
    ErrorBuilder::new(rejection.status())
        .error(INVALID_REQUEST)
        .message(rejection.body_text())
        .build()
}

fn invalid_json(err: serde_json::Error) -> Problem {
    invalid_request()
        .message("Invalid JSON in request body")
        .details(json!({
            "reason": err.to_string(),
            "line": err.line(),
            "column": err.column(),
        }))
        .build()
}

/// Record a batch of location samples for one device
#[utoipa::path(
    post,
    path = "/locations/batch",
    tag = "locations",
    request_body = LocationBatch,
    params(
        ("X-API-Key" = Option<String>, Header, description = "API key; `Authorization: Bearer` is also accepted")
    ),
    responses(
        (status = 201, description = "Batch stored (200 when configured)", body = BatchAcceptedResponse),
        (status = 400, description = "Malformed JSON or validation failure", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 500, description = "Batch could not be stored", body = ErrorBody)
    )
)]
pub async fn ingest_batch(
    State(state): State<Arc<LocationsAppState>>,
    _guard: ApiKeyGuard,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, Problem> {
    let body = body.map_err(body_rejection)?;
    let payload: Value = serde_json::from_slice(&body).map_err(invalid_json)?;

    let batch = validate_batch(&payload).map_err(|failure| {
        debug!("Rejected location batch: {}", failure);
        Problem::from(failure)
    })?;

    let device = state
        .store
        .upsert_device(&batch.device_id, batch.device_info.as_ref())
        .await
        .map_err(|e| {
            error!("Failed to upsert device {}: {}", batch.device_id, e);
            Problem::from(e)
        })?;

    let received_count = state
        .store
        .insert_locations(device, &batch.locations)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert {} locations for device {}: {}",
                batch.len(),
                batch.device_id,
                e
            );
            Problem::from(e)
        })?;

    info!(
        "Recorded {} locations for device {}",
        received_count, batch.device_id
    );

    Ok((
        success_status_code(state.config.success_status),
        Json(BatchAcceptedResponse::new(received_count)),
    ))
}

/// Report whether the service can reach its storage
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<LocationsAppState>>) -> impl IntoResponse {
    let (status_code, status) = match state.store.probe_liveness().await {
        Ok(()) => (StatusCode::OK, HealthStatus::Healthy),
        Err(e) => {
            warn!("Health probe failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            timestamp: iso_timestamp_now(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLocationStore;

    fn state(
        store: Arc<InMemoryLocationStore>,
        config: IngestConfig,
    ) -> State<Arc<LocationsAppState>> {
        State(Arc::new(LocationsAppState::new(store, config)))
    }

    #[tokio::test]
    async fn test_ingest_batch_direct_call() {
        let store = Arc::new(InMemoryLocationStore::new());
        let body = Bytes::from_static(
            br#"{"device_id":"abc","locations":[{"latitude":1,"longitude":2,"timestamp":"t"}]}"#,
        );

        let response = ingest_batch(
            state(store.clone(), IngestConfig::default()),
            ApiKeyGuard,
            Ok(body),
        )
        .await
        .map(IntoResponse::into_response)
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(store.locations().await.len(), 1);
    }

    #[tokio::test]
    async fn test_ingest_batch_honours_success_status() {
        let store = Arc::new(InMemoryLocationStore::new());
        let config = IngestConfig {
            success_status: SuccessStatus::Ok,
            ..IngestConfig::default()
        };
        let body = Bytes::from_static(
            br#"{"device_id":"abc","locations":[{"latitude":1,"longitude":2,"timestamp":"t"}]}"#,
        );

        let response = ingest_batch(state(store, config), ApiKeyGuard, Ok(body))
            .await
            .map(IntoResponse::into_response)
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_json_details() {
        let store = Arc::new(InMemoryLocationStore::new());
        let result = ingest_batch(
            state(store.clone(), IngestConfig::default()),
            ApiKeyGuard,
            Ok(Bytes::from_static(b"{\"device_id\": ")),
        )
        .await;

        let Err(problem) = result else {
            panic!("expected a problem response");
        };
        assert_eq!(problem.status_code, StatusCode::BAD_REQUEST);
        assert_eq!(problem.message(), Some("Invalid JSON in request body"));
        assert_eq!(problem.body["details"]["line"], 1);
        assert!(store.locations().await.is_empty());
    }

    #[tokio::test]
    async fn test_nothing_stored_when_validation_fails() {
        let store = Arc::new(InMemoryLocationStore::new());
        let body = Bytes::from_static(
            br#"{"device_id":"abc","locations":[{"latitude":1,"longitude":2,"timestamp":"t"},{"latitude":95,"longitude":2,"timestamp":"t"}]}"#,
        );

        let result = ingest_batch(
            state(store.clone(), IngestConfig::default()),
            ApiKeyGuard,
            Ok(body),
        )
        .await;
        assert!(result.is_err());
        assert!(store.locations().await.is_empty());
        assert!(store.device("abc").await.is_none());
    }

    #[test]
    fn test_openapi_lists_both_paths() {
        let doc = LocationsApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/locations/batch"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
