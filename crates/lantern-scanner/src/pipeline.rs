//! Per-identifier fetch pipeline.
//!
//! Runs the ordered strategy chain with retry and backoff and always ends in
//! exactly one terminal [`ProfileRecord`].

use crate::error::StrategyError;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::strategy::FetchStrategy;
use lantern_auth::{AuthSessionManager, SessionContext};
use lantern_core::{Identifier, ProfileRecord, ScrapeStatus};
use lantern_net::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns one identifier into one terminal record.
pub struct FetchPipeline {
    strategies: Vec<Arc<dyn FetchStrategy>>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    auth: Arc<AuthSessionManager>,
    base_url: String,
}

impl FetchPipeline {
    /// Pipeline trying `strategies` in order under `policy`.
    ///
    /// `base_url` is used to build the profile link of terminal records.
    #[must_use]
    pub fn new(
        strategies: Vec<Arc<dyn FetchStrategy>>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        auth: Arc<AuthSessionManager>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            strategies,
            policy,
            clock,
            auth,
            base_url: base_url.into(),
        }
    }

    /// Fetch `identifier`, never failing.
    ///
    /// The session is checked before every attempt. An authentication
    /// failure invalidates the shared context and stops immediately. When a
    /// strategy runs out of retries while throttled, the next strategy gets a
    /// single attempt and the record ends as `rate_limited` if that fails too.
    pub async fn fetch(&self, identifier: &Identifier, context: &SessionContext) -> ProfileRecord {
        if self.strategies.is_empty() {
            return self.terminal(identifier, ScrapeStatus::Error, "no fetch strategies configured");
        }

        let mut last_error: Option<StrategyError> = None;
        let mut throttled_out = false;

        for strategy in &self.strategies {
            let method = strategy.method();
            let budget = if throttled_out { 0 } else { self.policy.max_retries };
            let mut attempt = 0;

            loop {
                if !context.is_authenticated() {
                    debug!(%identifier, "session not authenticated, skipping fetch");
                    return self.terminal(
                        identifier,
                        ScrapeStatus::AuthRequired,
                        "session is not authenticated",
                    );
                }

                debug!(%identifier, %method, attempt = attempt + 1, "fetch attempt");
                let err = match strategy.attempt(identifier, context).await {
                    Ok(record) => {
                        info!(%identifier, %method, "fetched profile");
                        return record;
                    }
                    Err(err) => err,
                };

                match self.policy.decide(&err, attempt, budget) {
                    RetryDecision::Abort => {
                        warn!(%identifier, %method, error = %err, "authentication failed");
                        self.auth.invalidate(context);
                        return self.terminal(identifier, ScrapeStatus::AuthFailed, err.to_string());
                    }
                    RetryDecision::Retry(delay) => {
                        warn!(
                            "{} failed for {} (attempt {}/{}): {}, retrying in {:?}",
                            method,
                            identifier,
                            attempt + 1,
                            budget + 1,
                            err,
                            delay
                        );
                        self.clock.sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::Fallback => {
                        debug!(%identifier, %method, error = %err, "strategy exhausted");
                        if throttled_out {
                            return self.terminal(
                                identifier,
                                ScrapeStatus::RateLimited,
                                format!("rate limit reached: {err}"),
                            );
                        }
                        throttled_out = matches!(err, StrategyError::Throttled(_));
                        last_error = Some(err);
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(err) if throttled_out => {
                self.terminal(identifier, ScrapeStatus::RateLimited, format!("rate limit reached: {err}"))
            }
            Some(err) => {
                warn!(%identifier, error = %err, "all strategies failed");
                self.terminal(
                    identifier,
                    ScrapeStatus::Failed,
                    format!("all strategies failed, last error: {err}"),
                )
            }
            None => self.terminal(identifier, ScrapeStatus::Error, "pipeline ended without an outcome"),
        }
    }

    fn terminal(
        &self,
        identifier: &Identifier,
        status: ScrapeStatus,
        error: impl Into<String>,
    ) -> ProfileRecord {
        ProfileRecord::terminal(identifier, &self.base_url, status, error)
    }
}
