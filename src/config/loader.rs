//! Configuration loading from disk and the process environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// JSON object of service key to base URL.
pub const SERVICE_MAP_ENV: &str = "SERVICE_MAP";
/// Shared secret for the auth gate.
pub const SERVICE_MAP_PASSWORD_ENV: &str = "SERVICE_MAP_PASSWORD";
/// Listener bind address.
pub const BIND_ADDRESS_ENV: &str = "GATEWAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Read and parse a TOML configuration file.
///
/// Validation is left to the caller so that environment overrides can be
/// applied first.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides on top of a file or default configuration.
///
/// `lookup` abstracts `std::env::var` so tests can feed a fabricated
/// environment.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(SERVICE_MAP_ENV) {
        config.services = parse_service_map_json(&raw);
    }

    // An empty variable is treated as unset so it cannot silently open a
    // gateway whose file config carries a secret.
    if let Some(secret) = lookup(SERVICE_MAP_PASSWORD_ENV).filter(|s| !s.is_empty()) {
        config.gateway.shared_secret = Some(secret);
    }

    if let Some(bind) = lookup(BIND_ADDRESS_ENV).filter(|s| !s.is_empty()) {
        config.listener.bind_address = bind;
    }
}

/// Parse a `SERVICE_MAP` value.
///
/// Never fails: malformed JSON or a non-object degrades to an empty map, and
/// entries whose value is not a string are skipped.
pub fn parse_service_map_json(raw: &str) -> BTreeMap<String, String> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse {}, using empty service map", SERVICE_MAP_ENV);
            return BTreeMap::new();
        }
    };

    let serde_json::Value::Object(entries) = value else {
        tracing::error!("{} is not a JSON object, using empty service map", SERVICE_MAP_ENV);
        return BTreeMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(url) => Some((key, url)),
            other => {
                tracing::warn!(service = %key, value = %other, "Ignoring non-string service URL");
                None
            }
        })
        .collect()
}

/// Load configuration from an optional file plus the environment, then
/// validate it.
///
/// A file that cannot be read or parsed is reported and replaced by defaults
/// rather than aborting; only semantic validation errors are returned.
pub fn load<F>(path: Option<&Path>, lookup: F) -> Result<(GatewayConfig, Option<ConfigError>), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, file_error) = match path {
        Some(path) => match load_config(path) {
            Ok(config) => (config, None),
            Err(e) => (GatewayConfig::default(), Some(e)),
        },
        None => (GatewayConfig::default(), None),
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok((config, file_error))
}
