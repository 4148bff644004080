//! Response relay and error responses.
//!
//! # Responsibilities
//! - Copy the upstream status, reason phrase, headers and body for the client
//! - Synthesize JSON error envelopes for gateway failures
//! - Answer CORS preflights
//! - Attach the gateway's CORS headers to all of the above
//!
//! # Design Decisions
//! - Bodies are copied byte-for-byte; no content-type sniffing or re-encoding
//! - Upstream CORS headers are dropped so the gateway's are never duplicated
//! - Output goes through `ResponseSink`, keeping the pipeline independent of
//!   the HTTP framework

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hyper::ext::ReasonPhrase;

use crate::error::GatewayError;
use crate::http::forward::UpstreamResponse;
use crate::security::cors::CorsPolicy;
use crate::security::headers::relay_response_headers;

/// Where a finished response is written.
pub trait ResponseSink {
    fn set_status(&mut self, status: StatusCode);

    /// Overrides the canonical reason phrase for the status.
    fn set_reason(&mut self, reason: ReasonPhrase);

    /// Adds a header value; repeated names keep every value.
    fn set_header(&mut self, name: HeaderName, value: HeaderValue);

    fn write_body(&mut self, body: Bytes);
}

impl ResponseSink for Response<Body> {
    fn set_status(&mut self, status: StatusCode) {
        *self.status_mut() = status;
    }

    fn set_reason(&mut self, reason: ReasonPhrase) {
        // hyper writes this extension into the HTTP/1 status line
        self.extensions_mut().insert(reason);
    }

    fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers_mut().append(name, value);
    }

    fn write_body(&mut self, body: Bytes) {
        *self.body_mut() = Body::from(body);
    }
}

/// The gateway's answer to one request.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyResponse {
    /// Relay an upstream response.
    pub fn relay(upstream: UpstreamResponse, cors: &CorsPolicy) -> Self {
        let mut headers = relay_response_headers(&upstream.headers);
        cors.apply(&mut headers);

        Self {
            status: upstream.status,
            reason: upstream.reason,
            headers,
            body: upstream.body,
        }
    }

    /// JSON error envelope for a gateway failure.
    pub fn error(err: &GatewayError, cors: &CorsPolicy, mount_path: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        cors.apply_to_error(&mut headers);

        Self {
            status: err.status(),
            reason: None,
            headers,
            body: Bytes::from(err.to_json(mount_path).to_string()),
        }
    }

    /// 200 with an empty body for an `OPTIONS` preflight.
    pub fn preflight(cors: &CorsPolicy) -> Self {
        let mut headers = HeaderMap::new();
        cors.apply(&mut headers);

        Self {
            status: StatusCode::OK,
            reason: None,
            headers,
            body: Bytes::new(),
        }
    }

    /// Write this response into any sink.
    pub fn write_to<S: ResponseSink>(self, sink: &mut S) {
        sink.set_status(self.status);
        if let Some(reason) = self.reason {
            sink.set_reason(reason);
        }
        for (name, value) in &self.headers {
            sink.set_header(name.clone(), value.clone());
        }
        sink.write_body(self.body);
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::empty());
        self.write_to(&mut response);
        response
    }
}
