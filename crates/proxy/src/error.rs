//! Error types for the proxy.
//!
//! Every `ProxyError` variant maps to exactly one status code and a JSON body of the
//! form `{"error", "message", "details"}`. Nothing is retried.

use axum::http::header::ALLOW;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// A failed proxy request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream did not respond within {} ms", .0.as_millis())]
    Timeout(Duration),

    /// The upstream answered with a non-2xx status. Reported as a 500; the
    /// upstream status is kept in `details`.
    #[error("upstream responded with status {status}")]
    Upstream { status: u16, body: String },

    /// Connecting to or reading from the upstream failed.
    #[error("failed to reach upstream: {0}")]
    Network(String),

    /// The upstream body was not valid JSON.
    #[error("upstream returned invalid JSON: {0}")]
    Decode(String),

    #[error("only GET is supported")]
    MethodNotAllowed,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ProxyError::Upstream { .. } | ProxyError::Network(_) | ProxyError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Short, stable label for the `error` field.
    pub fn label(&self) -> &'static str {
        match self {
            ProxyError::Timeout(_) => "Request timeout",
            ProxyError::Upstream { .. } => "Upstream error",
            ProxyError::Network(_) => "Failed to fetch project cards",
            ProxyError::Decode(_) => "Invalid upstream response",
            ProxyError::MethodNotAllowed => "Method not allowed",
        }
    }

    pub fn body(&self) -> Value {
        let details = match self {
            ProxyError::Timeout(limit) => json!({ "timeout_ms": limit.as_millis() as u64 }),
            ProxyError::Upstream { status, body } => json!({ "status": status, "body": body }),
            ProxyError::Network(cause) | ProxyError::Decode(cause) => json!(cause),
            ProxyError::MethodNotAllowed => json!({ "allow": "GET" }),
        };
        json!({
            "error": self.label(),
            "message": self.to_string(),
            "details": details,
        })
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut resp = (self.status(), Json(self.body())).into_response();
        if matches!(self, ProxyError::MethodNotAllowed) {
            resp.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
        }
        resp
    }
}

/// Errors building the proxy from its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FOLIO_PROXY_UPSTREAM is not set")]
    MissingUpstream,

    #[error("upstream must be an http(s) URL: {0}")]
    InvalidUpstream(String),

    #[error("invalid bind address: {0}")]
    InvalidBind(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
