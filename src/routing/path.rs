//! Route parsing.
//!
//! # Responsibilities
//! - Strip the mount prefix from the request path
//! - Split the remainder into the service key and sub-path
//!
//! # Design Decisions
//! - Empty segments are discarded, so `//foo//bar/` and `/foo/bar` parse the same
//! - Segments are not percent-decoded; they are forwarded as received
//! - Pure function of the path string

use crate::error::GatewayError;

/// A parsed `/{mount}/{service_key}/{sub_path}` request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute<'a> {
    /// First non-empty segment after the mount point.
    pub service_key: &'a str,
    /// Remaining segments joined with `/`; empty when there are none.
    pub sub_path: String,
}

/// Return the part of `path` below `mount`, or `None` if the path is not
/// under the mount point.
///
/// `mount` is compared on segment boundaries: `/proxyfoo` is not under
/// `/proxy`. A mount of `/` or `""` covers every path.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let mount = mount.trim_end_matches('/');
    if mount.is_empty() {
        return Some(path);
    }

    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Parse a request path into its service key and sub-path.
pub fn parse_route<'a>(path: &'a str, mount: &str) -> Result<ServiceRoute<'a>, GatewayError> {
    let rest = strip_mount(path, mount).ok_or_else(|| GatewayError::NotMounted {
        path: path.to_string(),
    })?;

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let service_key = segments.next().ok_or(GatewayError::MissingServiceKey)?;
    let sub_path = segments.collect::<Vec<_>>().join("/");

    Ok(ServiceRoute {
        service_key,
        sub_path,
    })
}
