//! Session establishment, verification and invalidation.

use crate::context::{SessionContext, SessionState};
use crate::credential::SessionCredential;
use lantern_core::{LanternError, PlatformConfig, Result};
use lantern_net::{HeaderProfile, PacedClient};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How sure verification is that the session works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// The structured profile endpoint answered with user data
    High,
    /// Only the home page probe passed
    Low,
}

/// Outcome of [`AuthSessionManager::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid(Confidence),
    Expired,
    Blocked,
}

impl SessionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Owns the current [`SessionContext`] and every change to its state.
pub struct AuthSessionManager {
    client: PacedClient,
    platform: PlatformConfig,
    request_timeout: Duration,
    current: RwLock<Option<Arc<SessionContext>>>,
}

impl AuthSessionManager {
    #[must_use]
    pub fn new(client: PacedClient, platform: PlatformConfig, request_timeout: Duration) -> Self {
        Self {
            client,
            platform,
            request_timeout,
            current: RwLock::new(None),
        }
    }

    /// Validate a credential and make its context the current one.
    ///
    /// No network call is made.
    ///
    /// # Errors
    /// Returns `Validation` if the credential is malformed.
    pub fn establish(&self, session_id: &str, csrf_token: Option<&str>) -> Result<Arc<SessionContext>> {
        let credential = SessionCredential::parse(session_id, csrf_token)?;
        let headers = HeaderProfile::randomized().headers(self.platform.base(), &self.platform.app_id);
        let context = Arc::new(SessionContext::new(credential, headers, self.request_timeout));

        info!(subject_id = context.subject_id(), "established session");

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(context.clone());
        Ok(context)
    }

    /// Context created by the latest successful [`establish`](Self::establish).
    pub fn current(&self) -> Option<Arc<SessionContext>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Probe the platform to check whether the session is still usable.
    ///
    /// The home page is requested first without following redirects. If it
    /// passes, the structured profile endpoint for a well-known handle decides
    /// between high and low confidence.
    ///
    /// # Errors
    /// Returns `Authentication` if a probe fails at the transport level. The
    /// context state is left untouched in that case.
    pub async fn verify(&self, context: &SessionContext) -> Result<SessionStatus> {
        let home_url = format!("{}/", self.platform.base());
        let home = self
            .client
            .send(context.request(home_url))
            .await
            .map_err(|e| LanternError::Authentication(format!("session probe failed: {e}")))?;

        if home.is_login_redirect() {
            let previous = context.replace_state(SessionState::Expired);
            warn!(subject_id = context.subject_id(), %previous, "session expired");
            return Ok(SessionStatus::Expired);
        }
        if home.status != 200 && !home.is_redirect() {
            let previous = context.replace_state(SessionState::Blocked);
            warn!(
                subject_id = context.subject_id(),
                status = home.status,
                %previous,
                "session blocked"
            );
            return Ok(SessionStatus::Blocked);
        }

        let probe_url = self.platform.profile_api_url(&self.platform.probe_handle);
        let probe = self
            .client
            .send(context.request(probe_url))
            .await
            .map_err(|e| LanternError::Authentication(format!("session probe failed: {e}")))?;

        let confidence = if probe.status == 200 && has_user_data(&probe.body) {
            Confidence::High
        } else {
            debug!(status = probe.status, "profile probe inconclusive, assuming low confidence");
            Confidence::Low
        };

        context.replace_state(SessionState::Active);
        info!(subject_id = context.subject_id(), ?confidence, "session verified");
        Ok(SessionStatus::Valid(confidence))
    }

    /// Mark an active context as invalidated.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn invalidate(&self, context: &SessionContext) -> bool {
        let changed = context.transition(SessionState::Active, SessionState::Invalidated);
        if changed {
            warn!(
                subject_id = context.subject_id(),
                established_at = %context.established_at(),
                "session invalidated"
            );
        }
        changed
    }
}

fn has_user_data(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|value| value["data"]["user"].is_object())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_user_data() {
        assert!(has_user_data(r#"{"data":{"user":{"id":"1"}}}"#));
        assert!(!has_user_data(r#"{"data":{"user":null}}"#));
        assert!(!has_user_data(r#"{"status":"fail"}"#));
        assert!(!has_user_data("<html></html>"));
    }

    #[test]
    fn test_status_is_valid() {
        assert!(SessionStatus::Valid(Confidence::Low).is_valid());
        assert!(!SessionStatus::Expired.is_valid());
        assert!(!SessionStatus::Blocked.is_valid());
    }
}
