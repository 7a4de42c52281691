//! Configuration management for Lantern.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/lantern/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Retry, pacing and concurrency settings
    pub scraping: ScrapingConfig,
    /// Per-caller request quota
    pub quota: QuotaConfig,
    /// Remote platform endpoints
    pub platform: PlatformConfig,
    /// Log filter settings
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
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `LANTERN_MAX_RETRIES`: Override retry cap per strategy
    /// - `LANTERN_MAX_WORKERS`: Override concurrent worker count
    /// - `LANTERN_MIN_INTERVAL`: Override minimum seconds between requests
    ///   (raises the maximum too if it would fall below the new minimum)
    /// - `LANTERN_MAX_INTERVAL`: Override maximum seconds between requests
    /// - `LANTERN_BASE_URL`: Override platform base URL
    /// - `LANTERN_LOG`: Override log filter
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply `LANTERN_*` environment overrides to this configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("LANTERN_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                self.scraping.max_retries = retries;
                tracing::debug!("Override scraping.max_retries from env: {}", retries);
            }
        }

        if let Ok(val) = std::env::var("LANTERN_MAX_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.scraping.max_concurrent_workers = workers;
                tracing::debug!(
                    "Override scraping.max_concurrent_workers from env: {}",
                    workers
                );
            }
        }

        if let Ok(val) = std::env::var("LANTERN_MIN_INTERVAL") {
            if let Ok(secs) = val.parse::<f64>() {
                self.scraping.min_request_interval = secs;
                if self.scraping.max_request_interval < secs {
                    self.scraping.max_request_interval = secs;
                }
                tracing::debug!("Override scraping.min_request_interval from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("LANTERN_MAX_INTERVAL") {
            if let Ok(secs) = val.parse() {
                self.scraping.max_request_interval = secs;
                tracing::debug!("Override scraping.max_request_interval from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("LANTERN_BASE_URL") {
            tracing::debug!("Override platform.base_url from env: {}", val);
            self.platform.base_url = val;
        }

        if let Ok(val) = std::env::var("LANTERN_LOG") {
            self.logging.filter = val;
        }
    }

    /// Write configuration to `path` as TOML.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(config_dir) = path.parent() {
            fs::create_dir_all(config_dir)?;
        }
        tracing::debug!("Saving config to {}", path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/lantern/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "lantern", "lantern").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check invariants the runtime components rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        let s = &self.scraping;
        check_seconds("scraping.retry_base_delay_seconds", s.retry_base_delay_seconds)?;
        check_seconds("scraping.min_request_interval", s.min_request_interval)?;
        check_seconds("scraping.max_request_interval", s.max_request_interval)?;
        check_seconds("scraping.request_timeout_seconds", s.request_timeout_seconds)?;
        check_seconds("quota.window_seconds", self.quota.window_seconds)?;

        if s.max_request_interval < s.min_request_interval {
            return Err(invalid(
                "scraping.max_request_interval",
                "must not be smaller than min_request_interval",
            ));
        }
        if s.max_concurrent_workers == 0 {
            return Err(invalid("scraping.max_concurrent_workers", "must be at least 1"));
        }
        if s.request_timeout_seconds == 0.0 {
            return Err(invalid("scraping.request_timeout_seconds", "must be positive"));
        }
        if self.quota.max_requests == 0 {
            return Err(invalid("quota.max_requests", "must be at least 1"));
        }
        if url::Url::parse(&self.platform.base_url).is_err() {
            return Err(invalid("platform.base_url", "not a valid URL"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_seconds(field: &str, value: f64) -> ConfigResult<()> {
    match Duration::try_from_secs_f64(value) {
        Ok(_) => Ok(()),
        Err(_) => Err(invalid(
            field,
            "must be a finite, non-negative number of seconds within range",
        )),
    }
}

/// Retry, pacing and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Retries per strategy after the first attempt
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub retry_base_delay_seconds: f64,
    /// Minimum spacing between two outbound requests, in seconds
    pub min_request_interval: f64,
    /// Upper bound of the randomized spacing, in seconds
    pub max_request_interval: f64,
    /// Upper bound on identifiers fetched concurrently
    pub max_concurrent_workers: usize,
    /// Per-request timeout, in seconds
    pub request_timeout_seconds: f64,
}

impl ScrapingConfig {
    /// Backoff base as a `Duration`.
    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_base_delay_seconds)
    }

    /// Minimum pacing interval as a `Duration`.
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs_f64(self.min_request_interval)
    }

    /// Maximum pacing interval as a `Duration`.
    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_secs_f64(self.max_request_interval)
    }

    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_seconds)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_seconds: 5.0,
            min_request_interval: 2.0,
            max_request_interval: 4.0,
            max_concurrent_workers: 3,
            request_timeout_seconds: 30.0,
        }
    }
}

/// Sliding-window quota applied per caller key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Requests admitted per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_seconds: f64,
}

impl QuotaConfig {
    /// Window length as a `Duration`.
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs_f64(self.window_seconds)
    }
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_requests: 50,
            window_seconds: 3600.0,
        }
    }
}

/// Remote platform endpoints and identity headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform, without trailing slash
    pub base_url: String,
    /// Web application id sent with every request
    pub app_id: String,
    /// Well-known public handle used to probe session health
    pub probe_handle: String,
}

impl PlatformConfig {
    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Host part of the base URL, if it has one.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Structured profile endpoint for `handle`.
    #[must_use]
    pub fn profile_api_url(&self, handle: &str) -> String {
        format!(
            "{}/api/v1/users/web_profile_info/?username={}",
            self.base(),
            urlencoding::encode(handle)
        )
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.instagram.com".to_string(),
            app_id: "936619743392459".to_string(),
            probe_handle: "instagram".to_string(),
        }
    }
}

/// Log filter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,lantern=debug".to_string(),
        }
    }
}
