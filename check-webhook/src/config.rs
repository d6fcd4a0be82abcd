//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into an immutable [`Config`] that the
//! web layer shares through its state.

use std::env;
use std::fmt;

use secrecy::{ExposeSecret, Secret};
use thiserror::Error;
use tracing::warn;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body limit (100 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    InvalidVar { name: &'static str, value: String },
}

/// Which bytes of a delivery the signature is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Parse the JSON body and hash its compact re-serialization.
    #[default]
    Reserialized,
    /// Hash the body exactly as received on the wire.
    Raw,
}

impl BodyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyMode::Reserialized => "reserialized",
            BodyMode::Raw => "raw",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reserialized" => Some(BodyMode::Reserialized),
            "raw" => Some(BodyMode::Raw),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used as the HMAC key
    pub webhook_token: Secret<String>,

    /// Bytes the signature covers
    pub body_mode: BodyMode,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Build a configuration with the given secret and default settings.
    pub fn new(webhook_token: impl Into<String>) -> Self {
        Config {
            port: DEFAULT_PORT,
            webhook_token: Secret::new(webhook_token.into()),
            body_mode: BodyMode::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_token = lookup("WEBHOOK_TOKEN")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("WEBHOOK_TOKEN"))?;

        let body_mode = match lookup("SIGNATURE_BODY_MODE") {
            Some(raw) => BodyMode::parse(&raw).ok_or(ConfigError::InvalidVar {
                name: "SIGNATURE_BODY_MODE",
                value: raw,
            })?,
            None => BodyMode::default(),
        };

        Ok(Config {
            port: parse_or_default(&lookup, "PORT", DEFAULT_PORT),
            webhook_token: Secret::new(webhook_token),
            body_mode,
            max_body_bytes: parse_or_default(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),
        })
    }

    /// Raw bytes of the shared secret.
    pub fn secret_bytes(&self) -> &[u8] {
        self.webhook_token.expose_secret().as_bytes()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("webhook_token", &"[REDACTED]")
            .field("body_mode", &self.body_mode)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

/// Parse a variable, falling back to the default when unset or invalid.
fn parse_or_default<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[("WEBHOOK_TOKEN", "s3cret")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.body_mode, BodyMode::Reserialized);
        assert_eq!(config.max_body_bytes, 102_400);
        assert_eq!(config.secret_bytes(), b"s3cret");
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "s3cret"),
            ("PORT", "9000"),
            ("SIGNATURE_BODY_MODE", "RAW"),
            ("MAX_BODY_BYTES", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.body_mode, BodyMode::Raw);
        assert_eq!(config.max_body_bytes, 2048);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "s3cret"),
            ("PORT", "not-a-port"),
        ]))
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_missing_token() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("WEBHOOK_TOKEN")));

        let err = Config::from_lookup(lookup_from(&[("WEBHOOK_TOKEN", "")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("WEBHOOK_TOKEN")));
    }

    #[test]
    fn test_invalid_body_mode() {
        let err = Config::from_lookup(lookup_from(&[
            ("WEBHOOK_TOKEN", "s3cret"),
            ("SIGNATURE_BODY_MODE", "pretty"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidVar { name: "SIGNATURE_BODY_MODE", .. }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::new("super-secret-value");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
