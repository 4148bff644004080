//! Header filtering in both directions.
//!
//! # Responsibilities
//! - Strip transport headers and the gateway password before forwarding
//! - Strip upstream CORS and framing headers before relaying
//!
//! # Design Decisions
//! - Deny-list, not allow-list: everything else (including `authorization`
//!   and `content-type`) passes through untouched
//! - Matching is case-insensitive because `HeaderName` is always lowercase

use axum::http::header::{self, HeaderMap, HeaderName};

use crate::security::auth::PASSWORD_HEADER;

/// Inbound headers never sent to a backend.
pub const REQUEST_DENY_LIST: [&str; 4] = ["host", "connection", "content-length", PASSWORD_HEADER];

/// Upstream framing headers dropped from relayed responses. The body is
/// relayed fully buffered, so the server sets its own framing.
const RESPONSE_HOP_BY_HOP: [HeaderName; 3] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    HeaderName::from_static("keep-alive"),
];

/// Returns true if the inbound header must not be forwarded.
pub fn is_denied_request_header(name: &HeaderName) -> bool {
    REQUEST_DENY_LIST.contains(&name.as_str())
}

/// Copy inbound headers for the upstream request, minus the deny-list.
///
/// Repeated headers keep every value.
pub fn forward_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if !is_denied_request_header(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

fn is_cors_header(name: &HeaderName) -> bool {
    name.as_str().starts_with("access-control-")
}

/// Copy upstream response headers for the client, minus any upstream CORS
/// headers and hop-by-hop framing headers.
pub fn relay_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_cors_header(name) || RESPONSE_HOP_BY_HOP.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
