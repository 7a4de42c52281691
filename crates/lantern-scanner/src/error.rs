//! Per-attempt strategy errors.

use lantern_net::TransportError;
use thiserror::Error;

/// Outcome of a single failed strategy attempt.
///
/// These never leave the pipeline; they decide whether to retry, fall back
/// or stop, and end up as the error detail of a terminal record.
#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    /// 401, login redirect or a `login_required` body
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// 429 or the platform's "please wait" page
    #[error("throttled by platform: {0}")]
    Throttled(String),

    /// Network failure, timeout or 5xx
    #[error("transport failure: {0}")]
    Transport(String),

    /// Response did not have the expected shape
    #[error("unparseable response: {0}")]
    Parse(String),

    /// Profile does not exist
    #[error("profile not found")]
    NotFound,
}

impl StrategyError {
    /// Whether the same strategy may be tried again after a backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Transport(_))
    }
}

impl From<TransportError> for StrategyError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result of a single strategy attempt.
pub type Result<T> = std::result::Result<T, StrategyError>;
