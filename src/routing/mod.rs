//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → path.rs (strip mount, extract service key + sub-path)
//!     → service_map.rs (service key → base URL)
//!     → Return: base URL or ServiceNotFound
//!
//! Service map construction (at startup):
//!     services table / SERVICE_MAP
//!     → Drop invalid entries
//!     → Freeze as immutable ServiceMap
//! ```
//!
//! # Design Decisions
//! - Service map built at startup, immutable at runtime
//! - No regex in hot path (segment split + exact map lookup)
//! - Deterministic: same path always resolves to the same backend

pub mod path;
pub mod service_map;

pub use path::{parse_route, ServiceRoute};
pub use service_map::ServiceMap;
