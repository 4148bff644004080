//! Gateway error taxonomy.
//!
//! Every failure a request can hit is terminal for that request and maps to
//! exactly one status code and a JSON envelope with at least an `error`
//! field. Nothing here is retried.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Why the auth gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The `x-service-map-password` header was absent.
    MissingSecret,
    /// The header was present but did not match.
    InvalidSecret,
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnauthorizedReason::MissingSecret => write!(f, "missing service map password"),
            UnauthorizedReason::InvalidSecret => write!(f, "invalid service map password"),
        }
    }
}

/// Transport-level failures talking to a backend.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// The backend did not answer within the configured deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, reset, or any other client error.
    #[error("{0}")]
    Transport(String),

    /// The constructed target URL was rejected by the HTTP client.
    #[error("invalid target URL: {0}")]
    InvalidUrl(String),
}

/// Errors produced by the proxy pipeline.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Service key missing in path")]
    MissingServiceKey,

    #[error("Path {path} is not served by this gateway")]
    NotMounted { path: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),

    #[error("No mapping found")]
    ServiceNotFound {
        service_key: String,
        available_services: Vec<String>,
    },

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Upstream request failed")]
    UpstreamUnreachable(#[source] UpstreamError),

    /// The whole request, body read included, outlived `timeouts.request_secs`.
    #[error("Request timed out")]
    RequestTimeout(Duration),

    #[error("Internal server error")]
    Internal(String),
}

impl GatewayError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingServiceKey => StatusCode::BAD_REQUEST,
            GatewayError::NotMounted { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::ServiceNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::RequestTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON envelope sent to the caller.
    pub fn to_json(&self, mount_path: &str) -> Value {
        let error = self.to_string();
        match self {
            GatewayError::MissingServiceKey | GatewayError::NotMounted { .. } => json!({
                "error": error,
                "hint": format!("URL should be like {}/{{serviceKey}}/...", mount_path),
            }),
            GatewayError::Unauthorized(UnauthorizedReason::MissingSecret) => json!({
                "error": error,
                "hint": "Add x-service-map-password header to your request",
            }),
            GatewayError::Unauthorized(UnauthorizedReason::InvalidSecret) => json!({ "error": error }),
            GatewayError::ServiceNotFound {
                service_key,
                available_services,
            } => json!({
                "error": error,
                "serviceKey": service_key,
                "availableServices": available_services,
            }),
            GatewayError::PayloadTooLarge { limit } => json!({
                "error": error,
                "limit": limit,
            }),
            GatewayError::UpstreamUnreachable(source) => json!({
                "error": error,
                "details": source.to_string(),
            }),
            GatewayError::RequestTimeout(after) => json!({
                "error": error,
                "details": format!("request not completed within {:?}", after),
            }),
            GatewayError::Internal(details) => json!({
                "error": error,
                "details": details,
            }),
        }
    }
}
