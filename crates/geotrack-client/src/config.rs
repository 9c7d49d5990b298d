//! Client configuration

use std::time::Duration;

pub const SERVER_URL_VAR: &str = "API_SERVER_URL";
pub const AUTHORIZATION_TOKEN_VAR: &str = "API_AUTHORIZATION_TOKEN";
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
const API_VERSION_SEGMENT: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Versioned API root, e.g. `http://localhost:8000/v1`
    pub server_url: String,
    /// Sent as `Authorization: Bearer <token>` when present
    pub authorization_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build from a server root; the API version segment is appended.
    pub fn new(server_root: &str) -> Self {
        Self {
            server_url: versioned_url(server_root),
            authorization_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_authorization_token(mut self, token: impl Into<String>) -> Self {
        self.authorization_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read `API_SERVER_URL` and `API_AUTHORIZATION_TOKEN` from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an injectable variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_root = lookup(SERVER_URL_VAR).unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let mut config = Self::new(&server_root);
        config.authorization_token = lookup(AUTHORIZATION_TOKEN_VAR);
        config
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

fn versioned_url(server_root: &str) -> String {
    if server_root.ends_with('/') {
        format!("{}{}", server_root, API_VERSION_SEGMENT)
    } else {
        format!("{}/{}", server_root, API_VERSION_SEGMENT)
    }
}
