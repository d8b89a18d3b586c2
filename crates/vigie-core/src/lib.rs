//! Vigie Core - Foundation crate for the Vigie compliance probe engine.
//!
//! This crate provides the shared vocabulary every other Vigie crate builds on:
//! the probe target, discovery provenance, error handling, configuration and
//! logging bootstrap.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared domain types (`ProbeTarget`, `Provenance`, `Candidate`)
//! - [`logging`] - `tracing-subscriber` initialization
//!
//! # Example
//!
//! ```rust
//! use vigie_core::{AppConfig, ProbeTarget};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let target = ProbeTarget::parse("https://www.example.com/")?;
//! assert_eq!(target.origin_domain(), "www.example.com");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, HttpConfig, LoggingConfig, PatternsConfig, ProbeConfig, ScanningConfig,
};
pub use error::{ConfigError, ConfigResult, Result, VigieError};
pub use types::{Candidate, ProbeTarget, Provenance};
