//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body limit)
//!     → request.rs (framework-neutral view of the request)
//!     → pipeline.rs (route → auth → resolve → forward)
//!     → forward.rs (target URL, single upstream call)
//!     → response.rs (relay or JSON error, CORS headers)
//!     → Send to client
//! ```

pub mod forward;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{HttpUpstream, Upstream, UpstreamRequest, UpstreamResponse};
pub use pipeline::Gateway;
pub use request::{InboundRequest, X_REQUEST_ID};
pub use response::{ProxyResponse, ResponseSink};
pub use server::{HttpServer, ServerError};
