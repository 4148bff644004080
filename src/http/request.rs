//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for tracing
//! - Expose the request to the pipeline through a minimal, adapter-agnostic
//!   interface
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The request ID is an ordinary header, so it is forwarded upstream too

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Correlation header set on every request and echoed on every response.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// What the pipeline needs to know about an inbound request.
pub trait InboundRequest {
    fn method(&self) -> &Method;

    /// Raw path, without the query string.
    fn path(&self) -> &str;

    /// Raw query string, without the leading `?`.
    fn query(&self) -> Option<&str>;

    fn headers(&self) -> &HeaderMap;

    fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers().get(name)
    }

    fn body_bytes(&self) -> Bytes;

    /// Correlation ID for logs, if one was assigned.
    fn request_id(&self) -> &str {
        self.header(X_REQUEST_ID.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

impl InboundRequest for Request<Bytes> {
    fn method(&self) -> &Method {
        Request::method(self)
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn query(&self) -> Option<&str> {
        self.uri().query()
    }

    fn headers(&self) -> &HeaderMap {
        Request::headers(self)
    }

    fn body_bytes(&self) -> Bytes {
        // Cheap: `Bytes` clones share the buffer.
        self.body().clone()
    }
}
