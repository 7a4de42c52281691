//! Shared request context derived from a validated credential.

use crate::credential::SessionCredential;
use lantern_core::Timestamp;
use lantern_net::HttpRequest;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

/// Lifecycle state of a session context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Usable for authenticated calls
    Active = 0,
    /// A fetch saw an authentication failure
    Invalidated = 1,
    /// Verification was redirected to the login surface
    Expired = 2,
    /// Verification got a terminal non-success response
    Blocked = 3,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Invalidated,
            2 => Self::Expired,
            _ => Self::Blocked,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "active",
            Self::Invalidated => "invalidated",
            Self::Expired => "expired",
            Self::Blocked => "blocked",
        };
        f.write_str(name)
    }
}

/// Cookie and header set for authenticated calls, shared by all workers.
///
/// The state is only changed by the [`AuthSessionManager`], always through
/// atomic transitions. A worker that read `Active` just before another worker
/// invalidated the context may still finish its request.
///
/// [`AuthSessionManager`]: crate::AuthSessionManager
pub struct SessionContext {
    credential: SessionCredential,
    device_id: String,
    headers: Vec<(String, String)>,
    request_timeout: Duration,
    established_at: Timestamp,
    state: AtomicU8,
}

impl SessionContext {
    pub(crate) fn new(
        credential: SessionCredential,
        headers: Vec<(String, String)>,
        request_timeout: Duration,
    ) -> Self {
        let mut headers = headers;
        if let Some(token) = credential.csrf_token() {
            headers.push(("X-CSRFToken".to_string(), token.to_string()));
        }

        Self {
            credential,
            device_id: uuid::Uuid::new_v4().to_string().to_uppercase(),
            headers,
            request_timeout,
            established_at: Timestamp::now(),
            state: AtomicU8::new(SessionState::Active as u8),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn subject_id(&self) -> &str {
        self.credential.subject_id()
    }

    pub fn established_at(&self) -> Timestamp {
        self.established_at
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn cookies(&self) -> Vec<(String, String)> {
        let mut cookies = vec![(
            "sessionid".to_string(),
            self.credential.session_id().to_string(),
        )];
        if let Some(token) = self.credential.csrf_token() {
            cookies.push(("csrftoken".to_string(), token.to_string()));
        }
        cookies.push(("ds_user_id".to_string(), self.subject_id().to_string()));
        cookies.push(("ig_did".to_string(), self.device_id.clone()));
        cookies.push(("ig_nrcb".to_string(), "1".to_string()));
        cookies
    }

    /// Authenticated GET request for `url`.
    pub fn request(&self, url: impl Into<String>) -> HttpRequest {
        let mut request = HttpRequest::get(url).timeout(self.request_timeout);
        request.headers = self.headers.clone();
        request.cookies = self.cookies();
        request
    }

    /// Move from `from` to `to`; false if the state was not `from`.
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Unconditionally set the state, returning the previous one.
    pub(crate) fn replace_state(&self, to: SessionState) -> SessionState {
        SessionState::from_u8(self.state.swap(to as u8, Ordering::AcqRel))
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("subject_id", &self.subject_id())
            .field("state", &self.state())
            .field("established_at", &self.established_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(csrf: Option<&str>) -> SessionContext {
        let credential =
            SessionCredential::parse("1234567890:AbCdEfGhIjKl:12:AYc", csrf).expect("valid");
        let headers = vec![("User-Agent".to_string(), "test-agent".to_string())];
        SessionContext::new(credential, headers, Duration::from_secs(10))
    }

    #[test]
    fn test_new_context_is_active() {
        let ctx = context(None);
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.state(), SessionState::Active);
    }

    #[test]
    fn test_cookies_and_headers() {
        let ctx = context(Some("csrfTOKEN123"));
        let cookies = ctx.cookies();
        let names: Vec<_> = cookies.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["sessionid", "csrftoken", "ds_user_id", "ig_did", "ig_nrcb"]
        );
        assert!(cookies.contains(&("ds_user_id".to_string(), "1234567890".to_string())));
        assert!(ctx
            .headers()
            .contains(&("X-CSRFToken".to_string(), "csrfTOKEN123".to_string())));
    }

    #[test]
    fn test_request_carries_session() {
        let ctx = context(None);
        let request = ctx.request("https://example.com/alice/");
        assert_eq!(request.timeout, Duration::from_secs(10));
        assert!(request
            .cookie_header()
            .is_some_and(|c| c.starts_with("sessionid=1234567890:")));
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn test_transition_is_compare_and_swap() {
        let ctx = context(None);
        assert!(ctx.transition(SessionState::Active, SessionState::Invalidated));
        assert!(!ctx.transition(SessionState::Active, SessionState::Invalidated));
        assert!(!ctx.is_authenticated());

        assert_eq!(ctx.replace_state(SessionState::Active), SessionState::Invalidated);
        assert!(ctx.is_authenticated());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let ctx = context(Some("csrfTOKEN123"));
        let debug = format!("{ctx:?}");
        assert!(!debug.contains("AbCdEfGhIjKl"));
        assert!(debug.contains("Active"));
    }
}
