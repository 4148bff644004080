//! Service lookup.
//!
//! # Responsibilities
//! - Store the service key → base URL table
//! - Resolve a service key to its base URL or an explicit not-found
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - Exact, case-sensitive match; no prefix or fuzzy matching
//! - Invalid entries are dropped at construction, never at lookup
//! - Ordered storage so diagnostics list keys deterministically

use std::collections::BTreeMap;

use url::Url;

use crate::error::GatewayError;

/// Immutable mapping from service key to backend base URL.
#[derive(Debug, Clone, Default)]
pub struct ServiceMap {
    entries: BTreeMap<String, String>,
}

impl ServiceMap {
    /// Build a map from raw entries.
    ///
    /// Entries with an empty key, or whose value is not an absolute
    /// `http`/`https` URL, are skipped with a warning. The stored value is the
    /// string as configured; it is not normalized.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let entries = entries
            .into_iter()
            .filter(|(key, base_url)| {
                if key.is_empty() {
                    tracing::warn!(base_url = %base_url, "Ignoring service with empty key");
                    return false;
                }
                match Url::parse(base_url) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => true,
                    Ok(url) => {
                        tracing::warn!(service = %key, scheme = url.scheme(), "Ignoring service with unsupported URL");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(service = %key, error = %e, "Ignoring service with invalid base URL");
                        false
                    }
                }
            })
            .collect();

        Self { entries }
    }

    /// Look up the base URL for `service_key`.
    pub fn resolve(&self, service_key: &str) -> Result<&str, GatewayError> {
        self.entries
            .get(service_key)
            .map(String::as_str)
            .ok_or_else(|| GatewayError::ServiceNotFound {
                service_key: service_key.to_string(),
                available_services: self.keys().map(str::to_string).collect(),
            })
    }

    /// Known service keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
