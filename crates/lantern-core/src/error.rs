//! Core error types for Lantern.
//!
//! This module defines the central error type surfaced to batch callers.
//! Per-identifier failures never use it: they are folded into a terminal
//! `ProfileRecord` by the fetch pipeline.

use std::time::Duration;
use thiserror::Error;

/// Central error type for all Lantern operations.
#[derive(Error, Debug)]
pub enum LanternError {
    /// Configuration errors (file loading, parsing, validation)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed identifier or credential, rejected before any network call
    #[error("validation error: {0}")]
    Validation(String),

    /// Session missing, invalid, expired or blocked
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Caller exhausted its request quota or the remote side throttled us
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Time until a new request would be admitted
        retry_after: Duration,
    },

    /// Network failure or timeout
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected response shape
    #[error("parse error: {0}")]
    Parse(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `LanternError`.
pub type Result<T> = std::result::Result<T, LanternError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LanternError::Validation("invalid identifier".to_string());
        assert_eq!(err.to_string(), "validation error: invalid identifier");

        let err = LanternError::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "rate limited, retry after 30s");
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let err: LanternError = config_err.into();
        assert!(matches!(err, LanternError::Config(_)));
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            field: "scraping.max_concurrent_workers".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("scraping.max_concurrent_workers"));
    }
}
