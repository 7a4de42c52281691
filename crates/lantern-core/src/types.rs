//! Shared types used across Lantern.
//!
//! This module defines validated newtypes and a timestamp wrapper that
//! provide type safety at the crate boundaries.

use crate::error::LanternError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Maximum length of a handle on the platform.
pub const MAX_IDENTIFIER_LEN: usize = 30;

/// Hosts whose profile URLs are always accepted.
pub const PLATFORM_HOSTS: &[&str] = &["instagram.com", "www.instagram.com"];

/// Normalized target handle submitted for lookup.
///
/// Built from raw user input: surrounding whitespace and a leading `@` are
/// stripped, percent-encoded input is decoded and any `?query` / `#fragment`
/// remnant is dropped. Profile URLs are accepted only on a platform host and
/// only with a single path segment. The result must be 1-30 characters of
/// `[A-Za-z0-9_.]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Normalize and validate a raw identifier.
    ///
    /// # Errors
    /// Returns `LanternError::Validation` if the normalized handle is empty,
    /// too long or contains characters outside the allowed set, or if a URL
    /// does not point at a profile on one of [`PLATFORM_HOSTS`].
    pub fn parse(raw: &str) -> Result<Self, LanternError> {
        Self::parse_with_hosts(raw, &[])
    }

    /// Like [`parse`](Self::parse), additionally accepting profile URLs on
    /// `extra_hosts` (for example the host of a configured base URL).
    pub fn parse_with_hosts(raw: &str, extra_hosts: &[&str]) -> Result<Self, LanternError> {
        let decoded = urlencoding::decode(raw.trim())
            .map_err(|e| LanternError::Validation(format!("invalid identifier '{raw}': {e}")))?;
        let stripped = decoded.trim().trim_start_matches('@');

        let lower = stripped.to_ascii_lowercase();
        let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::handle_from_url(stripped, extra_hosts)?
        } else if lower.starts_with("www.") || lower.starts_with("instagram.com/") {
            Self::handle_from_url(&format!("https://{stripped}"), extra_hosts)?
        } else {
            stripped.to_string()
        };

        let handle = candidate
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        Self::validate(handle)?;
        Ok(Self(handle.to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn handle_from_url(raw: &str, extra_hosts: &[&str]) -> Result<String, LanternError> {
        let url = url::Url::parse(raw)
            .map_err(|e| LanternError::Validation(format!("invalid profile URL '{raw}': {e}")))?;

        let host = url.host_str().unwrap_or_default();
        let known = PLATFORM_HOSTS
            .iter()
            .chain(extra_hosts)
            .any(|h| h.eq_ignore_ascii_case(host));
        if !known {
            return Err(LanternError::Validation(format!(
                "profile URL '{raw}' is not on a platform host"
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        match segments.as_slice() {
            [handle] => Ok((*handle).to_string()),
            [] => Err(LanternError::Validation(format!(
                "profile URL has no handle: '{raw}'"
            ))),
            _ => Err(LanternError::Validation(format!(
                "'{raw}' is not a profile URL"
            ))),
        }
    }

    /// Validate handle format: `[A-Za-z0-9_.]`, 1-30 chars.
    fn validate(handle: &str) -> Result<(), LanternError> {
        static HANDLE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex =
            HANDLE_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.]{1,30}$").expect("valid regex"));

        if handle.is_empty() || handle.len() > MAX_IDENTIFIER_LEN {
            return Err(LanternError::Validation(format!(
                "invalid identifier: must be 1-{MAX_IDENTIFIER_LEN} characters, got {} characters",
                handle.len()
            )));
        }

        if regex.is_match(handle) {
            Ok(())
        } else {
            Err(LanternError::Validation(format!(
                "invalid identifier: only letters, digits, '_' and '.' are allowed, got '{handle}'"
            )))
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = LanternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_identifier_valid() {
        let valid = vec!["alice", "bob_smith", "carol.jones", "A1_b2.C3", "x"];

        for raw in valid {
            let id = Identifier::parse(raw).expect("valid identifier");
            assert_eq!(id.as_str(), raw);
        }
    }

    #[test]
    fn test_identifier_normalization() {
        let cases = vec![
            ("  @alice  ", "alice"),
            ("@@bob", "bob"),
            ("https://www.instagram.com/carol/", "carol"),
            ("https://instagram.com/dave?igsh=abc", "dave"),
            ("www.instagram.com/erin/#top", "erin"),
            ("frank%2Ejones", "frank.jones"),
            ("%40grace", "grace"),
            ("heidi?utm_source=share", "heidi"),
            ("instagram.com/ivan", "ivan"),
            ("HTTPS://WWW.INSTAGRAM.COM/judy", "judy"),
        ];

        for (raw, expected) in cases {
            let id = Identifier::parse(raw).unwrap_or_else(|e| panic!("{raw}: {e}"));
            assert_eq!(id.as_str(), expected, "normalizing {raw}");
        }
    }

    #[test]
    fn test_identifier_invalid() {
        let too_long = "a".repeat(31);
        let invalid = vec![
            "bad user!",
            "",
            "@",
            "   ",
            "hyphen-ated",
            "emoji😀",
            "https://instagram.com/",
            "https://evil.example/alice",
            "https://instagram.com.evil.example/alice",
            "https://www.instagram.com/p/ABC123/",
            "https://www.instagram.com/alice/reels/",
            "ftp://instagram.com/alice",
            too_long.as_str(),
        ];

        for raw in invalid {
            let err = Identifier::parse(raw).unwrap_err();
            assert!(
                matches!(err, LanternError::Validation(_)),
                "Should fail for: {raw}"
            );
        }
    }

    #[test]
    fn test_identifier_serde_validates() {
        let id: Identifier = serde_json::from_str("\"alice\"").expect("deserialize identifier");
        assert_eq!(id.as_str(), "alice");
        assert!(serde_json::from_str::<Identifier>("\"bad user!\"").is_err());
    }

    #[test]
    fn test_identifier_with_extra_host() {
        let id = Identifier::parse_with_hosts("https://platform.test/alice/", &["platform.test"])
            .expect("configured host");
        assert_eq!(id.as_str(), "alice");
        assert!(Identifier::parse("https://platform.test/alice/").is_err());
    }

    #[test]
    fn test_timestamp_display() {
        let dt = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(Timestamp::from(dt).to_string(), "2025-03-04 05:06:07");
    }
}
