//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing, request ID)
//! - Bound each request by the inbound deadline, answering 408 as JSON
//! - Read the inbound body within the configured limit
//! - Hand the buffered request to the pipeline
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::loader::ConfigError;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::forward::{HttpUpstream, Upstream};
use crate::http::pipeline::Gateway;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::observability::metrics;

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
pub struct AppState<U> {
    pub gateway: Arc<Gateway<U>>,
    pub max_body_size: usize,
    pub request_timeout: Duration,
}

impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            max_body_size: self.max_body_size,
            request_timeout: self.request_timeout,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server that forwards with the default HTTP client.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let upstream = HttpUpstream::new(&config.timeouts, &config.upstream)?;
        Self::with_upstream(config, upstream)
    }

    /// Create a server with a custom upstream implementation.
    pub fn with_upstream<U: Upstream>(config: GatewayConfig, upstream: U) -> Result<Self, ServerError> {
        let gateway = Arc::new(Gateway::from_config(&config, upstream)?);

        tracing::info!(
            mount_path = %gateway.mount_path(),
            services = ?gateway.services().keys().collect::<Vec<_>>(),
            "Gateway initialized"
        );

        let router = build_router(&config, gateway);
        Ok(Self { router, config })
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The fully layered router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router<U: Upstream>(config: &GatewayConfig, gateway: Arc<Gateway<U>>) -> Router {
    let state = AppState {
        gateway,
        max_body_size: config.gateway.max_body_size,
        request_timeout: Duration::from_secs(config.timeouts.request_secs),
    };

    Router::new()
        .route("/{*path}", any(proxy_handler::<U>))
        .route("/", any(proxy_handler::<U>))
        .with_state(state)
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}

/// Main proxy handler.
/// Runs the request under the inbound deadline.
async fn proxy_handler<U: Upstream>(
    State(state): State<AppState<U>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(state.request_timeout, buffer_and_handle(&state, request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                method = %method,
                path = %path,
                timeout = ?state.request_timeout,
                "Request timed out"
            );
            metrics::record_request(method.as_str(), 408, "none", start_time);
            state
                .gateway
                .error_response(&GatewayError::RequestTimeout(state.request_timeout))
                .into_response()
        }
    }
}

/// Buffers the body, then runs the pipeline.
async fn buffer_and_handle<U: Upstream>(state: &AppState<U>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    // GET and HEAD never forward a body, so don't read one
    let bytes = if parts.method == Method::GET || parts.method == Method::HEAD {
        Bytes::new()
    } else {
        match read_body(&parts.headers, body, state.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(method = %parts.method, path = %parts.uri.path(), error = %e, "Failed to read request body");
                return state.gateway.error_response(&e).into_response();
            }
        }
    };

    let request = Request::from_parts(parts, bytes);
    state.gateway.handle(&request).await.into_response()
}

async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(GatewayError::PayloadTooLarge { limit });
    }

    axum::body::to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.is::<LengthLimitError>() {
            GatewayError::PayloadTooLarge { limit }
        } else {
            GatewayError::Internal(format!("failed to read request body: {}", inner))
        }
    })
}
