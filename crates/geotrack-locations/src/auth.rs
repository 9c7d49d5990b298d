//! API key guard for the ingest endpoint

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use geotrack_core::error_builder::unauthorized;
use geotrack_core::problemdetails::Problem;
use geotrack_core::{mask_sensitive, secrets_match, AuthConfig};
use thiserror::Error;
use tracing::warn;

use crate::handlers::LocationsAppState;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("API key is required")]
    MissingKey,

    #[error("Invalid API key")]
    InvalidKey,
}

impl From<AuthError> for Problem {
    fn from(error: AuthError) -> Self {
        unauthorized().message(error.to_string()).build()
    }
}

/// The key presented by the caller, from `X-API-Key` or `Authorization: Bearer`.
pub fn presented_api_key(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    let from_bearer = || {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
    };

    from_header
        .filter(|key| !key.is_empty())
        .or_else(|| from_bearer().filter(|key| !key.is_empty()))
        .map(str::to_string)
}

/// Decide whether a request carrying `presented` may proceed.
pub fn authorize(config: &AuthConfig, presented: Option<&str>) -> Result<(), AuthError> {
    let Some(key) = presented else {
        return if config.require_api_key {
            Err(AuthError::MissingKey)
        } else {
            Ok(())
        };
    };

    if config.api_keys.is_empty() {
        return Ok(());
    }

    // Compare against every configured key so timing does not reveal which matched
    let matched = config
        .api_keys
        .iter()
        .fold(false, |found, expected| found | secrets_match(key, expected));

    if matched {
        Ok(())
    } else {
        Err(AuthError::InvalidKey)
    }
}

/// Extractor that rejects the request unless the API key policy passes
pub struct ApiKeyGuard;

impl FromRequestParts<Arc<LocationsAppState>> for ApiKeyGuard {
    type Rejection = Problem;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<LocationsAppState>,
    ) -> Result<Self, Self::Rejection> {
        let presented = presented_api_key(&parts.headers);
        authorize(&state.config.auth, presented.as_deref()).map_err(|e| {
            let shown = presented
                .as_deref()
                .map(mask_sensitive)
                .unwrap_or_else(|| "none".to_string());
            warn!("Rejected ingest request: {} (key {})", e, shown);
            Problem::from(e)
        })?;
        Ok(ApiKeyGuard)
    }
}
