//! Gateway CORS policy.
//!
//! The gateway's CORS headers are authoritative: they replace anything the
//! backend sent, and they are attached to preflight, relayed and (unless
//! disabled) error responses alike.

use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};

use crate::config::CorsConfig;

/// Pre-built CORS header values.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    enabled: bool,
    on_errors: bool,
    headers: HeaderMap,
}

impl CorsPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_str(&config.allow_origin)?,
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_str(&config.allow_methods)?,
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_str(&config.allow_headers)?,
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from(config.max_age_secs),
        );
        if config.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }

        Ok(Self {
            enabled: config.enabled,
            on_errors: config.on_errors,
            headers,
        })
    }

    /// Attach CORS headers to a preflight or relayed response.
    pub fn apply(&self, target: &mut HeaderMap) {
        if !self.enabled {
            return;
        }
        for (name, value) in &self.headers {
            target.insert(name.clone(), value.clone());
        }
    }

    /// Attach CORS headers to a gateway error response, if configured to.
    pub fn apply_to_error(&self, target: &mut HeaderMap) {
        if self.on_errors {
            self.apply(target);
        }
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        // The default config only holds valid header values.
        Self::from_config(&CorsConfig::default()).unwrap_or(Self {
            enabled: false,
            on_errors: false,
            headers: HeaderMap::new(),
        })
    }
}
