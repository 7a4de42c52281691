//! Retry policy for strategy attempts.

use crate::error::StrategyError;
use std::time::Duration;

/// What the pipeline does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try the same strategy again after the delay
    Retry(Duration),
    /// Give up on this strategy and move to the next one
    Fallback,
    /// Stop the pipeline for this identifier
    Abort,
}

/// Bounded exponential backoff.
///
/// A strategy gets one initial attempt plus up to `max_retries` retries. The
/// delay after failed attempt `n` (zero-based) is `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed per strategy after its first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_retries` retries starting at `base_delay`.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff before retrying after failed attempt `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Decide how to continue after `error` on zero-based `attempt`.
    ///
    /// `budget` is the number of retries still allowed for the current
    /// strategy; it is `max_retries` normally and zero for the single
    /// attempt made after a throttled strategy was exhausted.
    #[must_use]
    pub fn decide(&self, error: &StrategyError, attempt: u32, budget: u32) -> RetryDecision {
        match error {
            StrategyError::Unauthorized(_) => RetryDecision::Abort,
            e if e.is_retryable() && attempt < budget => {
                RetryDecision::Retry(self.delay_for(attempt))
            }
            _ => RetryDecision::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1))
    }

    #[test]
    fn test_exponential_delays() {
        let p = policy();
        assert_eq!(p.delay_for(0), Duration::from_secs(1));
        assert_eq!(p.delay_for(1), Duration::from_secs(2));
        assert_eq!(p.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_delay_saturates() {
        let p = RetryPolicy::new(100, Duration::from_secs(5));
        assert_eq!(p.delay_for(64), p.delay_for(32));
        assert!(p.delay_for(32) > p.delay_for(31));
    }

    #[test]
    fn test_retryable_errors_retry_within_budget() {
        let p = policy();
        let throttled = StrategyError::Throttled("429".into());

        assert_eq!(
            p.decide(&throttled, 0, 3),
            RetryDecision::Retry(Duration::from_secs(1))
        );
        assert_eq!(
            p.decide(&throttled, 2, 3),
            RetryDecision::Retry(Duration::from_secs(4))
        );
        assert_eq!(p.decide(&throttled, 3, 3), RetryDecision::Fallback);
        assert_eq!(p.decide(&throttled, 0, 0), RetryDecision::Fallback);
    }

    #[test]
    fn test_terminal_errors() {
        let p = policy();
        assert_eq!(
            p.decide(&StrategyError::Unauthorized("401".into()), 0, 3),
            RetryDecision::Abort
        );
        assert_eq!(
            p.decide(&StrategyError::Parse("bad".into()), 0, 3),
            RetryDecision::Fallback
        );
        assert_eq!(p.decide(&StrategyError::NotFound, 0, 3), RetryDecision::Fallback);
    }
}
