//! The request pipeline.
//!
//! ```text
//! OPTIONS ─────────────────────────────────────────────→ preflight 200
//! other   → parse route → auth gate → resolve service
//!         → build target (url, headers, body) → upstream call
//!         → relay response | JSON error
//! ```
//!
//! One pipeline serves every deployment; variant behavior (CORS on errors,
//! redirects, credentials) is configuration, not a separate handler.

use std::time::Instant;

use axum::http::Method;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::config::validation::ValidationError;
use crate::error::GatewayError;
use crate::http::forward::{build_target_url, outbound_body, Upstream, UpstreamRequest};
use crate::http::request::InboundRequest;
use crate::http::response::ProxyResponse;
use crate::observability::metrics;
use crate::routing::{parse_route, ServiceMap};
use crate::security::headers::forward_request_headers;
use crate::security::{CorsPolicy, SharedSecret, PASSWORD_HEADER};

/// Immutable per-process gateway state plus the upstream client.
#[derive(Debug)]
pub struct Gateway<U> {
    services: ServiceMap,
    secret: SharedSecret,
    cors: CorsPolicy,
    mount_path: String,
    upstream: U,
}

impl<U: Upstream> Gateway<U> {
    pub fn new(
        services: ServiceMap,
        secret: SharedSecret,
        cors: CorsPolicy,
        mount_path: impl Into<String>,
        upstream: U,
    ) -> Self {
        let mount_path = mount_path.into().trim_end_matches('/').to_string();
        Self {
            services,
            secret,
            cors,
            mount_path,
            upstream,
        }
    }

    /// Build the gateway from validated configuration.
    pub fn from_config(config: &GatewayConfig, upstream: U) -> Result<Self, ConfigError> {
        let cors = CorsPolicy::from_config(&config.cors).map_err(|e| {
            ConfigError::Validation(vec![ValidationError::new("cors", e.to_string())])
        })?;

        let services = ServiceMap::new(config.services.clone());
        let secret = SharedSecret::new(config.gateway.shared_secret.clone());

        if !secret.is_enabled() {
            tracing::warn!("No shared secret configured: gateway is open to any caller");
        }
        if services.is_empty() {
            tracing::warn!("Service map is empty: every request will be rejected");
        }

        Ok(Self::new(
            services,
            secret,
            cors,
            config.gateway.mount_path.as_str(),
            upstream,
        ))
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Handle one request end to end. Never fails: every error becomes a
    /// JSON response.
    pub async fn handle<R>(&self, request: &R) -> ProxyResponse
    where
        R: InboundRequest + Sync,
    {
        let start_time = Instant::now();
        let request_id = request.request_id();
        let method = request.method();
        let path = request.path();

        // Preflight: no auth, no forwarding
        if method == Method::OPTIONS {
            tracing::debug!(request_id = %request_id, path = %path, "CORS preflight");
            metrics::record_request(method.as_str(), 200, "none", start_time);
            return ProxyResponse::preflight(&self.cors);
        }

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Proxying request"
        );

        // 1. Parse route
        let route = match parse_route(path, &self.mount_path) {
            Ok(r) => r,
            Err(e) => return self.reject(e, request_id, method, None, start_time),
        };

        // 2. Auth gate
        if let Err(e) = self.secret.verify(request.header(PASSWORD_HEADER)) {
            return self.reject(e, request_id, method, None, start_time);
        }

        // 3. Resolve service
        let base_url = match self.services.resolve(route.service_key) {
            Ok(url) => url,
            Err(e) => return self.reject(e, request_id, method, None, start_time),
        };
        let service = route.service_key;

        // 4. Build outbound request
        let target_url = build_target_url(base_url, &route.sub_path, request.query());
        let outbound = UpstreamRequest {
            method: method.clone(),
            url: target_url.clone(),
            headers: forward_request_headers(request.headers()),
            body: outbound_body(method, request.body_bytes()),
        };

        tracing::info!(
            request_id = %request_id,
            service = %service,
            target_url = %target_url,
            "Forwarding to upstream"
        );

        // 5. Single upstream attempt
        match self.upstream.send(outbound).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    service = %service,
                    status = %response.status,
                    "Upstream responded"
                );
                metrics::record_request(method.as_str(), response.status.as_u16(), service, start_time);
                ProxyResponse::relay(response, &self.cors)
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    service = %service,
                    target_url = %target_url,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream_failure(service);
                self.reject(
                    GatewayError::UpstreamUnreachable(e),
                    request_id,
                    method,
                    Some(service),
                    start_time,
                )
            }
        }
    }

    /// Error response for a failure detected outside the pipeline, such as
    /// an unreadable request body.
    pub fn error_response(&self, err: &GatewayError) -> ProxyResponse {
        ProxyResponse::error(err, &self.cors, &self.mount_path)
    }

    fn reject(
        &self,
        err: GatewayError,
        request_id: &str,
        method: &Method,
        service: Option<&str>,
        start_time: Instant,
    ) -> ProxyResponse {
        let status = err.status();
        if status.is_client_error() {
            tracing::warn!(request_id = %request_id, status = %status, error = %err, "Request rejected");
        }
        metrics::record_request(method.as_str(), status.as_u16(), service.unwrap_or("none"), start_time);
        self.error_response(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Request, StatusCode};

    use crate::error::UpstreamError;
    use crate::http::forward::UpstreamResponse;

    /// Records every outbound request and answers from a fixed script.
    #[derive(Clone, Default)]
    struct RecordingUpstream {
        calls: Arc<Mutex<Vec<UpstreamRequest>>>,
        fail: bool,
    }

    impl RecordingUpstream {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<UpstreamRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Upstream for RecordingUpstream {
        async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
            self.calls.lock().unwrap().push(request);
            if self.fail {
                return Err(UpstreamError::Transport("connection refused".into()));
            }

            let mut headers = HeaderMap::new();
            headers.insert("content-type", HeaderValue::from_static("application/json"));
            headers.insert("access-control-allow-origin", HeaderValue::from_static("https://backend.example"));
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                reason: None,
                headers,
                body: Bytes::from_static(br#"{"ok":true}"#),
            })
        }
    }

    fn gateway(upstream: RecordingUpstream, secret: Option<&str>) -> Gateway<RecordingUpstream> {
        Gateway::new(
            ServiceMap::new([("svc-a".to_string(), "http://backend.local:9000".to_string())]),
            SharedSecret::new(secret.map(str::to_string)),
            CorsPolicy::default(),
            "/proxy",
            upstream,
        )
    }

    fn request(method: Method, uri: &str, headers: &[(&'static str, &'static str)], body: &'static [u8]) -> Request<Bytes> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Bytes::from_static(body)).unwrap()
    }

    fn json(response: &ProxyResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[tokio::test]
    async fn forwards_authorized_request() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), Some("s3cret"));

        let response = gw
            .handle(&request(
                Method::GET,
                "/proxy/svc-a/items?limit=5",
                &[("x-service-map-password", "s3cret")],
                b"",
            ))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, Bytes::from_static(br#"{"ok":true}"#));
        assert_eq!(response.headers["access-control-allow-origin"], "*");

        let calls = upstream.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].url, "http://backend.local:9000/items?limit=5");
        assert!(!calls[0].headers.contains_key("x-service-map-password"));
    }

    #[tokio::test]
    async fn missing_password_is_401_without_upstream_call() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), Some("s3cret"));

        let response = gw.handle(&request(Method::GET, "/proxy/svc-a/items", &[], b"")).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(json(&response)["error"].is_string());
        assert_eq!(response.headers["access-control-allow-origin"], "*");
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_service_is_404_with_available_services() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), None);

        let response = gw.handle(&request(Method::GET, "/proxy/unknown-svc/x", &[], b"")).await;

        assert_eq!(response.status, StatusCode::NOT_FOUND);
        let body = json(&response);
        assert_eq!(body["serviceKey"], "unknown-svc");
        assert_eq!(body["availableServices"], serde_json::json!(["svc-a"]));
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_service_key_is_400() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), None);

        let response = gw.handle(&request(Method::GET, "/proxy/", &[], b"")).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(json(&response)["hint"].is_string());
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn bad_path_reported_before_auth() {
        let gw = gateway(RecordingUpstream::default(), Some("s3cret"));
        let response = gw.handle(&request(Method::GET, "/proxy", &[], b"")).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn options_short_circuits() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), Some("s3cret"));

        let response = gw.handle(&request(Method::OPTIONS, "/proxy/unknown/anything", &[], b"")).await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.is_empty());
        assert_eq!(response.headers["access-control-allow-origin"], "*");
        assert_eq!(
            response.headers["access-control-allow-methods"],
            "GET,POST,PUT,PATCH,DELETE,OPTIONS"
        );
        assert!(upstream.calls().is_empty());
    }

    #[tokio::test]
    async fn get_and_head_never_send_a_body() {
        for method in [Method::GET, Method::HEAD] {
            let upstream = RecordingUpstream::default();
            let gw = gateway(upstream.clone(), None);

            gw.handle(&request(method.clone(), "/proxy/svc-a/x", &[], b"ignored body")).await;

            let calls = upstream.calls();
            assert_eq!(calls[0].method, method);
            assert!(calls[0].body.is_none());
        }
    }

    #[tokio::test]
    async fn raw_body_forwarded_untouched() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), None);
        let multipart: &'static [u8] =
            b"--x\r\nContent-Disposition: form-data; name=\"f\"; filename=\"a.bin\"\r\n\r\n\x00\xff\r\n--x--\r\n";

        gw.handle(&request(
            Method::POST,
            "/proxy/svc-a/upload",
            &[("content-type", "multipart/form-data; boundary=x")],
            multipart,
        ))
        .await;

        let calls = upstream.calls();
        assert_eq!(calls[0].body.as_deref(), Some(multipart));
        assert_eq!(calls[0].headers["content-type"], "multipart/form-data; boundary=x");
    }

    #[tokio::test]
    async fn forwarded_headers_are_inbound_minus_deny_list() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), Some("s3cret"));

        gw.handle(&request(
            Method::PUT,
            "/proxy/svc-a/items/1",
            &[
                ("host", "gateway.local"),
                ("connection", "keep-alive"),
                ("content-length", "2"),
                ("x-service-map-password", "s3cret"),
                ("authorization", "Bearer abc"),
                ("x-trace", "1"),
            ],
            b"{}",
        ))
        .await;

        let headers = &upstream.calls()[0].headers;
        let mut names: Vec<_> = headers.keys().map(|k| k.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["authorization", "x-trace"]);
    }

    #[tokio::test]
    async fn unreachable_upstream_is_stable_502() {
        let upstream = RecordingUpstream::failing();
        let gw = gateway(upstream.clone(), None);

        let first = gw.handle(&request(Method::GET, "/proxy/svc-a/x", &[], b"")).await;
        let second = gw.handle(&request(Method::GET, "/proxy/svc-a/x", &[], b"")).await;

        assert_eq!(first.status, StatusCode::BAD_GATEWAY);
        assert_eq!(second.status, StatusCode::BAD_GATEWAY);
        assert_eq!(json(&first), json(&second));
        assert_eq!(json(&first)["error"], "Upstream request failed");
        assert_eq!(upstream.calls().len(), 2);
    }

    #[tokio::test]
    async fn key_only_path_targets_base_url() {
        let upstream = RecordingUpstream::default();
        let gw = gateway(upstream.clone(), None);

        gw.handle(&request(Method::GET, "/proxy/svc-a?x=1", &[], b"")).await;

        assert_eq!(upstream.calls()[0].url, "http://backend.local:9000?x=1");
    }

    #[test]
    fn from_config_drops_bad_services() {
        let mut config = GatewayConfig::default();
        config.services.insert("good".into(), "http://good.local".into());
        config.services.insert("bad".into(), "nope".into());

        let gw = Gateway::from_config(&config, RecordingUpstream::default()).unwrap();
        assert_eq!(gw.services().keys().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(gw.mount_path(), "/proxy");
    }
}
