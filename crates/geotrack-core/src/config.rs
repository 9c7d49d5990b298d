//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 5,
        }
    }
}

/// Status code returned by the batch endpoint when a batch is stored.
///
/// Deployments disagree on this (the edge function answers 200, the
/// contract-first server answers 201), so it is configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SuccessStatus {
    Ok,
    #[default]
    Created,
}

impl SuccessStatus {
    pub fn as_u16(self) -> u16 {
        match self {
            SuccessStatus::Ok => 200,
            SuccessStatus::Created => 201,
        }
    }

    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(SuccessStatus::Ok),
            201 => Some(SuccessStatus::Created),
            _ => None,
        }
    }
}

/// API key requirements for the ingest endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Reject requests that carry no key at all
    pub require_api_key: bool,
    /// Accepted keys. Empty means any presented key is passed through.
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn required(api_keys: Vec<String>) -> Self {
        Self {
            require_api_key: true,
            api_keys,
        }
    }
}

/// Ingest endpoint behaviour that varies per deployment profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub success_status: SuccessStatus,
    pub auth: AuthConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            success_status: SuccessStatus::default(),
            auth: AuthConfig::open(),
        }
    }
}

/// Normalise a mount point: empty or "/" mounts at root, otherwise a single
/// leading slash and no trailing slash.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
