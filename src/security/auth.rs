//! Shared-secret auth gate.

use axum::http::HeaderValue;

use crate::error::{GatewayError, UnauthorizedReason};

/// Header carrying the shared secret. Never forwarded upstream.
pub const PASSWORD_HEADER: &str = "x-service-map-password";

/// The configured shared secret, or open mode when unset.
#[derive(Clone, Default)]
pub struct SharedSecret(Option<String>);

impl SharedSecret {
    /// An empty string is treated the same as no secret.
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.filter(|s| !s.is_empty()))
    }

    /// Returns false in open mode.
    pub fn is_enabled(&self) -> bool {
        self.0.is_some()
    }

    /// Check the value of the password header against the secret.
    ///
    /// Comparison is byte-for-byte: no trimming, no case folding.
    pub fn verify(&self, provided: Option<&HeaderValue>) -> Result<(), GatewayError> {
        let Some(expected) = &self.0 else {
            return Ok(());
        };

        match provided {
            None => Err(GatewayError::Unauthorized(UnauthorizedReason::MissingSecret)),
            Some(value) if value.as_bytes() == expected.as_bytes() => Ok(()),
            Some(_) => Err(GatewayError::Unauthorized(UnauthorizedReason::InvalidSecret)),
        }
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(_) => write!(f, "SharedSecret(<redacted>)"),
            None => write!(f, "SharedSecret(disabled)"),
        }
    }
}
