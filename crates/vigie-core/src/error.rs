//! Core error types for the Vigie probe engine.
//!
//! Probes never surface these errors to their callers: a probe always returns
//! a report. These types cover target validation and configuration, where
//! failing loudly is correct.

use thiserror::Error;

/// Central error type for Vigie operations outside the probe boundary.
#[derive(Error, Debug)]
pub enum VigieError {
    /// The URL handed to a probe is not an absolute http(s) URL with a host
    #[error("invalid probe target '{url}': {reason}")]
    InvalidTarget {
        /// URL as received
        url: String,
        /// Why it was rejected
        reason: String,
    },
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

/// Result type alias using `VigieError`.
pub type Result<T> = std::result::Result<T, VigieError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
