use crate::problemdetails;
use axum::http::StatusCode;
use serde::Serialize;

/// Error code for malformed or invalid requests
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
/// Error code for missing or rejected credentials
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
/// Error code for storage failures
pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
/// Error code for unmatched routes
pub const NOT_FOUND: &str = "Not Found";

pub struct ErrorBuilder {
    status: StatusCode,
    error: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl ErrorBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            error: String::new(),
            message: String::new(),
            details: None,
        }
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = error.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach a `details` object. Values that fail to serialize are dropped.
    pub fn details<T: Serialize>(mut self, details: T) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn build(self) -> problemdetails::Problem {
        let problem = problemdetails::new(self.status)
            .with_error(self.error)
            .with_message(self.message);

        match self.details {
            Some(details) => problem.with_details(details),
            None => problem,
        }
    }
}

// Common error builders
pub fn invalid_request() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::BAD_REQUEST)
        .error(INVALID_REQUEST)
        .message("The request was malformed or invalid")
}

pub fn unauthorized() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::UNAUTHORIZED)
        .error(UNAUTHORIZED)
        .message("Authentication is required to access this resource")
}

pub fn database_error() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
        .error(DATABASE_ERROR)
        .message("A database error occurred while processing your request")
}

pub fn not_found() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::NOT_FOUND)
        .error(NOT_FOUND)
        .message("Endpoint not found")
}
