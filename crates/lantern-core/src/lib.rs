//! Lantern Core - Foundation crate for the Lantern profile scraper.
//!
//! This crate provides the configuration, error handling and record types
//! that every other Lantern crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Validated newtypes (`Identifier`) and `Timestamp`
//! - [`record`] - Normalized `ProfileRecord` output with explicit sentinels
//!
//! # Example
//!
//! ```rust
//! use lantern_core::{AppConfig, Identifier};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//!
//! let handle = Identifier::parse("@some.handle")?;
//! assert_eq!(handle.as_str(), "some.handle");
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
pub mod record;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, LoggingConfig, PlatformConfig, QuotaConfig, ScrapingConfig};
pub use error::{ConfigError, ConfigResult, LanternError, Result};
pub use record::{profile_url, Count, FetchMethod, ProfileRecord, ScrapeStatus, UNKNOWN};
pub use types::{Identifier, Timestamp};
