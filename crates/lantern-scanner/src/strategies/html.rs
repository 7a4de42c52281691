//! Last-resort strategy: regular expressions over the raw profile page.

use super::common::fetch;
use crate::error::{Result, StrategyError};
use crate::strategy::FetchStrategy;
use async_trait::async_trait;
use lantern_auth::SessionContext;
use lantern_core::{profile_url, Count, FetchMethod, Identifier, PlatformConfig, ProfileRecord};
use lantern_net::PacedClient;
use regex::Regex;
use std::sync::OnceLock;

/// Scans the English profile page for embedded counters.
pub struct HtmlRegexStrategy {
    client: PacedClient,
    platform: PlatformConfig,
}

impl HtmlRegexStrategy {
    /// Strategy sending its requests through `client`.
    #[must_use]
    pub fn new(client: PacedClient, platform: PlatformConfig) -> Self {
        Self { client, platform }
    }
}

#[async_trait]
impl FetchStrategy for HtmlRegexStrategy {
    fn method(&self) -> FetchMethod {
        FetchMethod::HtmlRegex
    }

    async fn attempt(
        &self,
        identifier: &Identifier,
        context: &SessionContext,
    ) -> Result<ProfileRecord> {
        // English labels make the count fallback below predictable
        let url = format!("{}?hl=en", profile_url(self.platform.base(), identifier));
        let response = fetch(&self.client, context, url).await?;
        parse_html(&response.body, identifier, self.platform.base())
    }
}

struct Patterns {
    followers: Regex,
    following: Regex,
    posts: Regex,
    full_name: Regex,
    biography: Regex,
    external_url: Regex,
    picture: Regex,
    verified: Regex,
    private: Regex,
    followers_label: Regex,
    following_label: Regex,
    posts_label: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |pattern: &str| Regex::new(pattern).expect("valid regex");
        Patterns {
            followers: re(r#""edge_followed_by"\s*:\s*\{\s*"count"\s*:\s*(\d+)"#),
            following: re(r#""edge_follow"\s*:\s*\{\s*"count"\s*:\s*(\d+)"#),
            posts: re(r#""edge_owner_to_timeline_media"\s*:\s*\{\s*"count"\s*:\s*(\d+)"#),
            full_name: re(r#""full_name"\s*:\s*"((?:[^"\\]|\\.)*)""#),
            biography: re(r#""biography"\s*:\s*"((?:[^"\\]|\\.)*)""#),
            external_url: re(r#""external_url"\s*:\s*"((?:[^"\\]|\\.)*)""#),
            picture: re(r#""profile_pic_url_hd"\s*:\s*"((?:[^"\\]|\\.)*)""#),
            verified: re(r#""is_verified"\s*:\s*(true|false)"#),
            private: re(r#""is_private"\s*:\s*(true|false)"#),
            followers_label: re(r"([\d.,]+[KMBkmb]?)\s+[Ff]ollowers\b"),
            following_label: re(r"([\d.,]+[KMBkmb]?)\s+[Ff]ollowing\b"),
            posts_label: re(r"([\d.,]+[KMBkmb]?)\s+[Pp]osts\b"),
        }
    })
}

fn capture<'a>(regex: &Regex, body: &'a str) -> Option<&'a str> {
    regex
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Decode the body of a JSON string literal (`\u00e9`, `\/`).
fn unescape(raw: &str) -> Option<String> {
    serde_json::from_str(&format!("\"{raw}\"")).ok()
}

fn counter(exact: &Regex, label: &Regex, body: &str) -> Count {
    if let Some(n) = capture(exact, body).and_then(|n| n.parse::<u64>().ok()) {
        return Count::Exact(n);
    }
    capture(label, body).map_or(Count::Unknown, Count::parse_text)
}

pub(crate) fn parse_html(
    body: &str,
    identifier: &Identifier,
    base_url: &str,
) -> Result<ProfileRecord> {
    let p = patterns();

    let followers = counter(&p.followers, &p.followers_label, body);
    let following = counter(&p.following, &p.following_label, body);
    let posts = counter(&p.posts, &p.posts_label, body);

    if followers == Count::Unknown && posts == Count::Unknown {
        return Err(StrategyError::Parse(
            "no profile counters in page".to_string(),
        ));
    }

    let text = |regex: &Regex| capture(regex, body).and_then(unescape);

    let mut record = ProfileRecord::success(identifier, base_url, FetchMethod::HtmlRegex);
    record.followers = followers;
    record.following = following;
    record.post_count = posts;
    ProfileRecord::set_text(&mut record.display_name, text(&p.full_name).as_deref());
    ProfileRecord::set_text(&mut record.biography, text(&p.biography).as_deref());
    ProfileRecord::set_text(&mut record.external_url, text(&p.external_url).as_deref());
    ProfileRecord::set_text(&mut record.picture_url, text(&p.picture).as_deref());
    record.is_verified = capture(&p.verified, body) == Some("true");
    record.is_private = capture(&p.private, body) == Some("true");
    Ok(record)
}
