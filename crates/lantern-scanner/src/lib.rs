//! Lantern Scanner - profile scraping orchestration.
//!
//! This crate turns batches of user-supplied identifiers into normalized
//! [`ProfileRecord`](lantern_core::ProfileRecord)s using an authenticated
//! session, while pacing every outbound call and tolerating transient and
//! partial failures.
//!
//! # Features
//!
//! - Ordered fetch strategies (structured API, DOM parsing, regex over HTML)
//! - Retry with exponential backoff, fallback after exhaustion
//! - Eager session invalidation shared by every worker
//! - Concurrent batch dispatch with a configurable worker bound
//! - Post-count classification of successful records
//!
//! # Example
//!
//! ```rust,ignore
//! use lantern_core::AppConfig;
//! use lantern_scanner::ScrapeService;
//!
//! let service = ScrapeService::from_config(&AppConfig::load_with_env()?)?;
//! service.establish_session(&session_id, None)?;
//!
//! let result = service.submit_batch(&["alice", "@bob"]).await?;
//! println!("{} of {} fetched", result.successful, result.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classifier;
pub mod error;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod service;
pub mod strategies;
pub mod strategy;

// Re-export commonly used types
pub use classifier::{Classification, ResultClassifier};
pub use error::{Result, StrategyError};
pub use pipeline::FetchPipeline;
pub use retry::{RetryDecision, RetryPolicy};
pub use scheduler::{BatchHandle, BatchProgress, BatchResult, BatchScheduler};
pub use service::ScrapeService;
pub use strategies::{default_strategies, ApiStrategy, HtmlRegexStrategy, LibraryStrategy};
pub use strategy::FetchStrategy;
