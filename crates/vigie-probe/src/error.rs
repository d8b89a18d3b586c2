//! Error types for probe plumbing.
//!
//! Probes themselves never fail: every degraded stage ends up inside the
//! `ComplianceReport`. These errors only cover engine construction and
//! caller-side input validation.

use thiserror::Error;

/// Errors that can occur while setting up or invoking the probe engine.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The probe target is not an absolute http(s) URL
    #[error(transparent)]
    InvalidTarget(#[from] vigie_core::VigieError),

    /// The configuration failed validation
    #[error("configuration: {0}")]
    Config(#[from] vigie_core::ConfigError),

    /// Pattern libraries could not be loaded
    #[error("pattern libraries: {0}")]
    Patterns(#[from] vigie_patterns::PatternError),

    /// The HTTP fetcher could not be built
    #[error("fetcher: {0}")]
    Fetch(#[from] vigie_fetch::FetchError),

    /// Unknown probe name
    #[error("unknown probe: {0}")]
    UnknownProbe(String),
}

/// Result type for probe engine operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
