//! Service facade wiring the scraping engine from configuration.

use crate::pipeline::FetchPipeline;
use crate::retry::RetryPolicy;
use crate::scheduler::{BatchHandle, BatchResult, BatchScheduler};
use crate::strategies::default_strategies;
use lantern_auth::{AuthSessionManager, SessionContext, SessionStatus};
use lantern_core::{AppConfig, Identifier, LanternError, Result};
use lantern_net::{
    Clock, HttpClient, PacedClient, QuotaLimiter, ReqwestClient, RequestPacer, SystemClock,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Entry point for request-handling layers.
///
/// Owns one session manager, one process-wide pacer shared by every
/// outbound call, and the per-caller quota limiter.
pub struct ScrapeService {
    config: AppConfig,
    auth: Arc<AuthSessionManager>,
    quota: QuotaLimiter,
    scheduler: BatchScheduler,
}

impl ScrapeService {
    /// Build the production service: reqwest transport and the tokio clock.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is invalid, or `Transport` if the
    /// HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let client = ReqwestClient::new().map_err(|e| LanternError::Transport(e.to_string()))?;
        Self::with_parts(config.clone(), Arc::new(client), Arc::new(SystemClock))
    }

    /// Build the service on an injected transport and clock.
    ///
    /// # Errors
    /// Returns `Config` if the configuration is invalid.
    pub fn with_parts(
        config: AppConfig,
        client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let scraping = &config.scraping;
        let pacer = Arc::new(RequestPacer::new(
            clock.clone(),
            scraping.min_interval(),
            scraping.max_interval(),
        ));
        let paced = PacedClient::new(client, pacer);

        let auth = Arc::new(AuthSessionManager::new(
            paced.clone(),
            config.platform.clone(),
            scraping.request_timeout(),
        ));
        let pipeline = FetchPipeline::new(
            default_strategies(&paced, &config.platform),
            RetryPolicy::new(scraping.max_retries, scraping.retry_base_delay()),
            clock.clone(),
            auth.clone(),
            config.platform.base(),
        );
        let scheduler = BatchScheduler::new(Arc::new(pipeline), scraping.max_concurrent_workers);
        let quota = QuotaLimiter::new(clock, config.quota.max_requests, config.quota.window());

        Ok(Self {
            config,
            auth,
            quota,
            scheduler,
        })
    }

    /// Validate a credential and make it the session used by later batches.
    ///
    /// # Errors
    /// Returns `Validation` if the credential is malformed.
    pub fn establish_session(
        &self,
        session_id: &str,
        csrf_token: Option<&str>,
    ) -> Result<Arc<SessionContext>> {
        self.auth.establish(session_id, csrf_token)
    }

    /// Probe the platform with the current session.
    ///
    /// # Errors
    /// Returns `Authentication` if no session was established or a probe
    /// failed at the transport level.
    pub async fn verify_session(&self) -> Result<SessionStatus> {
        let context = self.current_session()?;
        self.auth.verify(&context).await
    }

    /// Fetch every identifier in `raw` with the current session.
    ///
    /// The whole batch is rejected before any network call if it is empty
    /// or any entry is not a valid identifier.
    ///
    /// # Errors
    /// Returns `Validation` for bad input and `Authentication` when no
    /// session was established.
    pub async fn submit_batch<S: AsRef<str>>(&self, raw: &[S]) -> Result<BatchResult> {
        let (identifiers, context) = self.prepare(raw)?;
        Ok(self.scheduler.submit(identifiers, context).await)
    }

    /// Like [`submit_batch`](Self::submit_batch), charged against the
    /// quota of `caller_key`.
    ///
    /// # Errors
    /// Returns `RateLimited` when the caller has no quota left, before any
    /// other check.
    pub async fn submit_batch_for<S: AsRef<str>>(
        &self,
        caller_key: &str,
        raw: &[S],
    ) -> Result<BatchResult> {
        if !self.quota.allow(caller_key) {
            let retry_after = self
                .quota
                .retry_after(caller_key)
                .unwrap_or_else(|| self.config.quota.window());
            warn!(caller = caller_key, ?retry_after, "batch rejected by quota");
            return Err(LanternError::RateLimited { retry_after });
        }
        self.submit_batch(raw).await
    }

    /// Batches `caller_key` may still submit in the current window.
    pub fn remaining_quota(&self, caller_key: &str) -> u32 {
        self.quota.remaining(caller_key)
    }

    /// Start a batch in the background and return its completion handle.
    ///
    /// # Errors
    /// Same pre-dispatch checks as [`submit_batch`](Self::submit_batch).
    pub fn spawn_batch<S: AsRef<str>>(&self, raw: &[S]) -> Result<BatchHandle> {
        let (identifiers, context) = self.prepare(raw)?;
        Ok(self.scheduler.spawn(identifiers, context))
    }

    fn current_session(&self) -> Result<Arc<SessionContext>> {
        self.auth.current().ok_or_else(|| {
            LanternError::Authentication("no session established".to_string())
        })
    }

    fn prepare<S: AsRef<str>>(&self, raw: &[S]) -> Result<(Vec<Identifier>, Arc<SessionContext>)> {
        if raw.is_empty() {
            return Err(LanternError::Validation(
                "batch contains no identifiers".to_string(),
            ));
        }

        let host = self.config.platform.host();
        let extra_hosts: Vec<&str> = host.as_deref().into_iter().collect();

        let identifiers = raw
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Identifier::parse_with_hosts(entry.as_ref(), &extra_hosts).map_err(|e| match e {
                    LanternError::Validation(reason) => LanternError::Validation(format!(
                        "entry {} ({:?}): {reason}",
                        index + 1,
                        entry.as_ref()
                    )),
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let context = self.current_session()?;
        info!(count = identifiers.len(), "batch accepted");
        Ok((identifiers, context))
    }
}
