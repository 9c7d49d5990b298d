use std::collections::BTreeMap;

use serde_json::Value;

use axum::http::{HeaderValue, StatusCode};
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Json};
use serde::Serialize;

use utoipa::ToSchema;

/// Body returned to the client for every non-2xx response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "error": "INVALID_REQUEST",
    "message": "Invalid latitude value",
    "details": {"field": "locations[0].latitude", "min": -90, "max": 90, "actual": 91.0}
}))]
pub struct ErrorBody {
    /// Machine readable error code
    #[schema(example = "INVALID_REQUEST")]
    pub error: String,
    /// A human-readable explanation of this occurrence of the problem
    #[schema(example = "Invalid latitude value")]
    pub message: String,
    /// Structured pointer to the offending field and the violated constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(additional_properties = true)]
    pub details: Option<Value>,
}

/// Representation of an error to return to the client.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The status code of the problem.
    pub status_code: StatusCode,
    /// The actual body of the problem.
    pub body: BTreeMap<String, Value>,
}

/// Create a new `Problem` response to send to the client.
pub fn new<S>(status_code: S) -> Problem
where
    S: Into<StatusCode>,
{
    Problem {
        status_code: status_code.into(),
        body: BTreeMap::new(),
    }
}

impl Problem {
    /// Specify the "error" code to use for the problem.
    pub fn with_error<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("error", value.into())
    }

    /// Specify the "message" to use for the problem.
    pub fn with_message<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("message", value.into())
    }

    /// Attach a structured "details" object.
    pub fn with_details<V>(self, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.with_value("details", value)
    }

    /// Specify an arbitrary value to include in the problem.
    ///
    /// # Parameters
    /// - `key` - The key for the value.
    /// - `value` - The value itself.
    pub fn with_value<V>(mut self, key: &str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.body.insert(key.to_owned(), value.into());

        self
    }

    /// The "error" code, if one was set.
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// The "message", if one was set.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code, Json(self.body)).into_response();

        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}
