//! Normalized profile records produced by the fetch pipeline.
//!
//! Every field of a [`ProfileRecord`] is always present. Text the source did
//! not provide is set to [`UNKNOWN`], counts use [`Count::Unknown`] and flags
//! default to `false`, so consumers never branch on field existence.

use crate::types::{Identifier, Timestamp};
use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel for values the source did not provide.
pub const UNKNOWN: &str = "N/A";

/// Terminal outcome of fetching one identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// Profile retrieved by one of the strategies
    Success,
    /// Session was not authenticated when the fetch started
    AuthRequired,
    /// Remote side rejected the session during the fetch
    AuthFailed,
    /// Remote side kept throttling after backoff
    RateLimited,
    /// Every strategy was exhausted
    Failed,
    /// Pipeline could not run at all
    Error,
}

impl ScrapeStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AuthRequired => "auth_required",
            Self::AuthFailed => "auth_failed",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::Error => "error",
        }
    }

    /// Whether this is [`ScrapeStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    /// Structured JSON profile endpoint
    Api,
    /// DOM-parsed profile page
    Library,
    /// Regex extraction from raw profile HTML
    HtmlRegex,
    /// No strategy succeeded
    None,
}

impl FetchMethod {
    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Library => "library",
            Self::HtmlRegex => "html_regex",
            Self::None => "none",
        }
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follower/following/post counter as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Count {
    /// Exact numeric value
    Exact(u64),
    /// Text the platform showed that could not be normalized
    Raw(String),
    /// Not reported
    #[default]
    Unknown,
}

impl Count {
    /// Normalize display text such as `"1,234"`, `"12.5K"` or `"3M"`.
    ///
    /// Empty text becomes [`Count::Unknown`]; anything else that is not a
    /// number is kept verbatim as [`Count::Raw`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn parse_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == UNKNOWN {
            return Self::Unknown;
        }

        let plain = trimmed.replace(',', "");
        if let Ok(n) = plain.parse::<u64>() {
            return Self::Exact(n);
        }

        let (number, multiplier) = match plain.chars().last() {
            Some('k' | 'K') => (&plain[..plain.len() - 1], 1_000.0),
            Some('m' | 'M') => (&plain[..plain.len() - 1], 1_000_000.0),
            Some('b' | 'B') => (&plain[..plain.len() - 1], 1_000_000_000.0),
            _ => return Self::Raw(trimmed.to_string()),
        };

        match number.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => {
                Self::Exact((value * multiplier).round() as u64)
            }
            _ => Self::Raw(trimmed.to_string()),
        }
    }

    /// Integer value, parsing raw text with thousands separators removed.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Exact(n) => Some(*n),
            Self::Raw(text) => text.trim().replace(',', "").parse().ok(),
            Self::Unknown => None,
        }
    }
}

impl From<u64> for Count {
    fn from(n: u64) -> Self {
        Self::Exact(n)
    }
}

impl From<Option<u64>> for Count {
    fn from(n: Option<u64>) -> Self {
        n.map_or(Self::Unknown, Self::Exact)
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Raw(text) => f.write_str(text),
            Self::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(n) => serializer.serialize_u64(*n),
            Self::Raw(text) => serializer.serialize_str(text),
            Self::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// Normalized profile metadata for one identifier.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRecord {
    pub identifier: Identifier,
    pub profile_url: String,
    pub display_name: String,
    pub biography: String,
    pub followers: Count,
    pub following: Count,
    pub post_count: Count,
    pub is_verified: bool,
    pub is_private: bool,
    pub external_url: String,
    pub picture_url: String,
    pub scraped_at: Timestamp,
    pub status: ScrapeStatus,
    pub method: FetchMethod,
    /// Last error seen for non-success records
    pub error: Option<String>,
}

impl ProfileRecord {
    /// Successful record skeleton with every value set to its sentinel.
    ///
    /// Strategies fill in whatever the source provided.
    #[must_use]
    pub fn success(identifier: &Identifier, base_url: &str, method: FetchMethod) -> Self {
        Self {
            identifier: identifier.clone(),
            profile_url: profile_url(base_url, identifier),
            display_name: UNKNOWN.to_string(),
            biography: UNKNOWN.to_string(),
            followers: Count::Unknown,
            following: Count::Unknown,
            post_count: Count::Unknown,
            is_verified: false,
            is_private: false,
            external_url: UNKNOWN.to_string(),
            picture_url: UNKNOWN.to_string(),
            scraped_at: Timestamp::now(),
            status: ScrapeStatus::Success,
            method,
            error: None,
        }
    }

    /// Terminal non-success record.
    #[must_use]
    pub fn terminal(
        identifier: &Identifier,
        base_url: &str,
        status: ScrapeStatus,
        error: impl Into<String>,
    ) -> Self {
        Self {
            status,
            method: FetchMethod::None,
            error: Some(error.into()),
            ..Self::success(identifier, base_url, FetchMethod::None)
        }
    }

    /// Replace a text field with `value` unless it is empty.
    pub fn set_text(field: &mut String, value: Option<&str>) {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            *field = v.to_string();
        }
    }
}

/// Canonical profile page URL for an identifier.
#[must_use]
pub fn profile_url(base_url: &str, identifier: &Identifier) -> String {
    format!("{}/{}/", base_url.trim_end_matches('/'), identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identifier {
        Identifier::parse("alice").expect("valid identifier")
    }

    #[test]
    fn test_count_parse_text() {
        assert_eq!(Count::parse_text("1,234"), Count::Exact(1234));
        assert_eq!(Count::parse_text("12.5K"), Count::Exact(12_500));
        assert_eq!(Count::parse_text("3M"), Count::Exact(3_000_000));
        assert_eq!(Count::parse_text(""), Count::Unknown);
        assert_eq!(Count::parse_text("N/A"), Count::Unknown);
        assert_eq!(Count::parse_text("lots"), Count::Raw("lots".to_string()));
    }

    #[test]
    fn test_count_as_u64() {
        assert_eq!(Count::Exact(7).as_u64(), Some(7));
        assert_eq!(Count::Raw("1,000".to_string()).as_u64(), Some(1000));
        assert_eq!(Count::Raw("many".to_string()).as_u64(), None);
        assert_eq!(Count::Unknown.as_u64(), None);
    }

    #[test]
    fn test_success_record_has_sentinels() {
        let record = ProfileRecord::success(&alice(), "https://example.com/", FetchMethod::Api);
        assert_eq!(record.profile_url, "https://example.com/alice/");
        assert_eq!(record.display_name, UNKNOWN);
        assert_eq!(record.followers, Count::Unknown);
        assert!(!record.is_private);
        assert!(record.status.is_success());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_terminal_record() {
        let record = ProfileRecord::terminal(
            &alice(),
            "https://example.com",
            ScrapeStatus::RateLimited,
            "throttled",
        );
        assert_eq!(record.status, ScrapeStatus::RateLimited);
        assert_eq!(record.method, FetchMethod::None);
        assert_eq!(record.error.as_deref(), Some("throttled"));
        assert_eq!(record.biography, UNKNOWN);
    }

    #[test]
    fn test_record_serialization() {
        let mut record = ProfileRecord::success(&alice(), "https://example.com", FetchMethod::Library);
        record.post_count = Count::Exact(12);
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["identifier"], "alice");
        assert_eq!(json["post_count"], 12);
        assert_eq!(json["followers"], UNKNOWN);
        assert_eq!(json["status"], "success");
        assert_eq!(json["method"], "library");
    }

    #[test]
    fn test_set_text_ignores_blank() {
        let mut field = UNKNOWN.to_string();
        ProfileRecord::set_text(&mut field, Some("   "));
        assert_eq!(field, UNKNOWN);
        ProfileRecord::set_text(&mut field, Some(" Alice "));
        assert_eq!(field, "Alice");
    }
}
