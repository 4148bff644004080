//! Upstream request construction and execution.
//!
//! # Responsibilities
//! - Build the target URL from base URL, sub-path and query
//! - Decide whether the inbound body is sent
//! - Execute exactly one upstream call, bounded by a timeout
//!
//! # Design Decisions
//! - The body is forwarded as raw bytes; it is never parsed or re-encoded
//! - GET and HEAD never carry a body upstream
//! - Every client failure becomes an `UpstreamError`, never a panic
//! - No retries

use std::future::Future;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use hyper::ext::ReasonPhrase;

use crate::config::schema::{TimeoutConfig, UpstreamConfig};
use crate::error::UpstreamError;

/// Join a base URL, sub-path and query string into the target URL.
///
/// Trailing slashes are removed from `base_url` and leading slashes from
/// `sub_path`; the two are joined with a single `/` only when the sub-path
/// is non-empty. A non-empty `query` is appended verbatim after `?`.
pub fn build_target_url(base_url: &str, sub_path: &str, query: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    let sub_path = sub_path.trim_start_matches('/');

    let mut url = String::with_capacity(base.len() + sub_path.len() + 2);
    url.push_str(base);
    if !sub_path.is_empty() {
        url.push('/');
        url.push_str(sub_path);
    }
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Returns the body to send upstream for `method`.
pub fn outbound_body(method: &Method, body: Bytes) -> Option<Bytes> {
    if method == Method::GET || method == Method::HEAD {
        None
    } else {
        Some(body)
    }
}

/// A fully-built outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A fully-buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Non-canonical reason phrase sent by the backend, if any.
    pub reason: Option<ReasonPhrase>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The outbound HTTP call.
pub trait Upstream: Send + Sync + 'static {
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}

/// `reqwest`-backed upstream client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpUpstream {
    /// Build the shared client once at startup.
    pub fn new(timeouts: &TimeoutConfig, upstream: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(timeouts.upstream_secs);
        let redirect = if upstream.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(timeout)
            .redirect(redirect)
            .no_proxy()
            .build()?;

        Ok(Self { client, timeout })
    }

    fn map_error(&self, error: reqwest::Error) -> UpstreamError {
        if error.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else if error.is_builder() {
            UpstreamError::InvalidUrl(error.to_string())
        } else {
            UpstreamError::Transport(error_chain(&error))
        }
    }
}

impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status();
        let reason = response.extensions().get::<ReasonPhrase>().cloned();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(UpstreamResponse {
            status,
            reason,
            headers,
            body,
        })
    }
}

/// Render an error with its sources, e.g. "error sending request: connection refused".
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
