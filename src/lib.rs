//! Service-map reverse proxy library.
//!
//! Forwards `{mount}/{serviceKey}/{rest}` to the base URL registered for
//! `serviceKey`, behind an optional shared-secret header.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::{Gateway, HttpServer};
pub use lifecycle::Shutdown;
