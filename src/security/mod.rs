//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → auth.rs (shared secret check, skipped for OPTIONS)
//!     → headers.rs (strip host/connection/content-length/password)
//!     → Forward upstream
//!
//! Outgoing response:
//!     → headers.rs (strip upstream CORS + framing headers)
//!     → cors.rs (attach gateway CORS headers)
//! ```
//!
//! # Design Decisions
//! - The password header never leaves the gateway
//! - Open mode (no secret) is allowed but logged loudly at startup
//! - The gateway's CORS headers always win over the backend's

pub mod auth;
pub mod cors;
pub mod headers;

pub use auth::{SharedSecret, PASSWORD_HEADER};
pub use cors::CorsPolicy;
