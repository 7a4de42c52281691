use lantern_core::{LanternError, Result};
use std::fmt;
use zeroize::Zeroizing;

/// Shortest session token the platform issues.
pub const MIN_SESSION_ID_LEN: usize = 20;

/// Validated session token plus optional CSRF token.
///
/// A session id looks like `<numeric subject id>:<segment>[:<segment>...]`,
/// possibly percent-encoded (`%3A` for `:`).
pub struct SessionCredential {
    session_id: Zeroizing<String>,
    csrf_token: Option<Zeroizing<String>>,
    subject_id: String,
}

impl SessionCredential {
    /// Validate a raw session id and optional CSRF token.
    pub fn parse(session_id: &str, csrf_token: Option<&str>) -> Result<Self> {
        let session_id = session_id.trim();
        if session_id.len() < MIN_SESSION_ID_LEN {
            return Err(LanternError::Validation(format!(
                "session id must be at least {MIN_SESSION_ID_LEN} characters"
            )));
        }
        if !session_id.chars().all(is_cookie_safe) {
            return Err(LanternError::Validation(
                "session id contains characters not allowed in a cookie".to_string(),
            ));
        }

        let decoded = Zeroizing::new(
            urlencoding::decode(session_id)
                .map_err(|_| LanternError::Validation("session id is not valid UTF-8".to_string()))?
                .into_owned(),
        );

        let mut parts = decoded.split(':');
        let subject_id = parts.next().unwrap_or_default();
        if subject_id.is_empty() || !subject_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(LanternError::Validation(
                "session id must start with a numeric user id".to_string(),
            ));
        }
        if !parts.next().is_some_and(|segment| !segment.is_empty()) {
            return Err(LanternError::Validation(
                "session id must contain a ':'-separated segment after the user id".to_string(),
            ));
        }

        let csrf_token = match csrf_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) if token.chars().all(is_cookie_safe) => {
                Some(Zeroizing::new(token.to_string()))
            }
            Some(_) => {
                return Err(LanternError::Validation(
                    "CSRF token contains characters not allowed in a cookie".to_string(),
                ))
            }
            None => None,
        };

        Ok(Self {
            subject_id: subject_id.to_string(),
            session_id: Zeroizing::new(session_id.to_string()),
            csrf_token,
        })
    }

    /// Numeric platform user id the session belongs to.
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Session id as supplied (still percent-encoded if it was).
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_ref().map(|t| t.as_str())
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("subject_id", &self.subject_id)
            .field("session_id", &"<redacted>")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn is_cookie_safe(c: char) -> bool {
    c.is_ascii_graphic() && !matches!(c, ';' | ',' | '"' | '\\')
}
