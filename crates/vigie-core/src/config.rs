//! Configuration management for Vigie.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main engine configuration.
///
/// This is loaded from `~/.config/vigie/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub http: HttpConfig,
    /// Probe budget, timeouts and fan-out caps
    pub probe: ProbeConfig,
    /// Multi-probe scan settings
    pub scanning: ScanningConfig,
    /// Pattern library overrides
    pub patterns: PatternsConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// See [`AppConfig::apply_env_overrides`] for the supported variables.
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides in place.
    ///
    /// Supports the following environment variables:
    /// - `VIGIE_BUDGET_MS`: Override the per-probe wall-clock budget
    /// - `VIGIE_USER_AGENT`: Override the HTTP user agent
    /// - `VIGIE_LOG`: Override the log filter directive
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VIGIE_BUDGET_MS") {
            if let Ok(budget) = val.parse() {
                self.probe.budget_ms = budget;
                tracing::debug!("Override probe.budget_ms from env: {}", budget);
            }
        }

        if let Ok(val) = std::env::var("VIGIE_USER_AGENT") {
            if !val.trim().is_empty() {
                tracing::debug!("Override http.user_agent from env: {}", val);
                self.http.user_agent = val;
            }
        }

        if let Ok(val) = std::env::var("VIGIE_LOG") {
            if !val.trim().is_empty() {
                self.logging.filter = val;
            }
        }
    }

    /// Check cross-field constraints.
    ///
    /// Every optional-stage timeout must be strictly smaller than the probe
    /// budget, so that worst-case latency stays bounded by
    /// `origin_timeout_ms + budget_ms`.
    pub fn validate(&self) -> ConfigResult<()> {
        let budget = self.probe.budget_ms;
        if budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.budget_ms".to_string(),
                reason: "budget must be greater than zero".to_string(),
            });
        }

        let optional = [
            ("probe.sitemap_timeout_ms", self.probe.sitemap_timeout_ms),
            ("probe.target_timeout_ms", self.probe.target_timeout_ms),
            ("probe.robots_timeout_ms", self.probe.robots_timeout_ms),
            ("probe.secondary_timeout_ms", self.probe.secondary_timeout_ms),
        ];
        for (field, timeout) in optional {
            if timeout == 0 || timeout >= budget {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: format!("must be between 1 and {} (budget), got {timeout}", budget - 1),
                });
            }
        }

        if self.probe.max_sitemaps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.max_sitemaps".to_string(),
                reason: "at least one sitemap fetch is required".to_string(),
            });
        }

        if self.scanning.concurrent_probes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanning.concurrent_probes".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/vigie/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "vigie", "vigie").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent string
    pub user_agent: String,
    /// Maximum number of redirects followed per fetch
    pub max_redirects: usize,
    /// Timeout of the mandatory origin fetch, in milliseconds
    pub origin_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Vigie/0.1.0 (+https://github.com/vigie-compliance/vigie)".to_string(),
            max_redirects: 5,
            origin_timeout_ms: 10_000,
        }
    }
}

/// Probe budget, per-stage timeouts and fan-out caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Wall-clock budget for optional stages, in milliseconds
    pub budget_ms: u64,
    /// Timeout of each sitemap fetch
    pub sitemap_timeout_ms: u64,
    /// Timeout of the located target page fetch
    pub target_timeout_ms: u64,
    /// Timeout of the robots.txt fetch
    pub robots_timeout_ms: u64,
    /// Timeout of secondary fetches (scripts, manifests, service workers)
    pub secondary_timeout_ms: u64,
    /// Maximum number of sitemap documents fetched per probe
    pub max_sitemaps: usize,
    /// Maximum number of secondary fetches per probe
    pub max_secondary_fetches: usize,
    /// Maximum number of entries in a resource inventory
    pub max_inventory_items: usize,
    /// Maximum number of entries per vendor category
    pub max_items_per_category: usize,
    /// Body size cap for sitemap, manifest and script fetches, in bytes
    pub max_document_bytes: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            budget_ms: 9_000,
            sitemap_timeout_ms: 3_000,
            target_timeout_ms: 4_000,
            robots_timeout_ms: 3_000,
            secondary_timeout_ms: 3_000,
            max_sitemaps: 3,
            max_secondary_fetches: 2,
            max_inventory_items: 100,
            max_items_per_category: 25,
            max_document_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Multi-probe scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// Number of probes run concurrently for one scan
    pub concurrent_probes: usize,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            concurrent_probes: 4,
        }
    }
}

/// Pattern library overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternsConfig {
    /// Directory of TOML pattern libraries replacing the built-in ones
    pub dir: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,vigie=debug".to_string(),
            json: false,
        }
    }
}
