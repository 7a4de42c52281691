//! Profile page parsed as a DOM.
//!
//! Reads the OpenGraph meta tags the platform renders for link previews and
//! any JSON-LD `ProfilePage` block, which together cover the counters, name,
//! biography and picture without running any script.

use super::common::fetch;
use crate::error::{Result, StrategyError};
use crate::strategy::FetchStrategy;
use async_trait::async_trait;
use lantern_auth::SessionContext;
use lantern_core::{profile_url, Count, FetchMethod, Identifier, PlatformConfig, ProfileRecord};
use lantern_net::PacedClient;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

const PRIVATE_MARKER: &str = "This Account is Private";

/// Parses OpenGraph and JSON-LD metadata from the profile page.
pub struct LibraryStrategy {
    client: PacedClient,
    platform: PlatformConfig,
}

impl LibraryStrategy {
    /// Strategy sending its requests through `client`.
    #[must_use]
    pub fn new(client: PacedClient, platform: PlatformConfig) -> Self {
        Self { client, platform }
    }
}

#[async_trait]
impl FetchStrategy for LibraryStrategy {
    fn method(&self) -> FetchMethod {
        FetchMethod::Library
    }

    async fn attempt(
        &self,
        identifier: &Identifier,
        context: &SessionContext,
    ) -> Result<ProfileRecord> {
        let url = profile_url(self.platform.base(), identifier);
        let response = fetch(&self.client, context, url).await?;
        parse_page(&response.body, identifier, self.platform.base())
    }
}

/// Counters parsed from an `og:description` such as
/// `"1,234 Followers, 56 Following, 78 Posts - See photos..."`.
struct Counters {
    followers: Count,
    following: Count,
    posts: Count,
}

fn parse_counters(description: &str) -> Option<Counters> {
    static COUNTERS_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = COUNTERS_REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)([\d.,]+[KMB]?)\s+Followers?,\s*([\d.,]+[KMB]?)\s+Following,\s*([\d.,]+[KMB]?)\s+Posts?",
        )
        .expect("valid regex")
    });

    let caps = regex.captures(description)?;
    Some(Counters {
        followers: Count::parse_text(&caps[1]),
        following: Count::parse_text(&caps[2]),
        posts: Count::parse_text(&caps[3]),
    })
}

/// Display name from an `og:title` like `"Alice (@alice) • Instagram photos"`.
fn name_from_title(title: &str) -> Option<&str> {
    title
        .split_once(" (@")
        .map(|(name, _)| name.trim())
        .filter(|name| !name.is_empty())
}

fn meta_content<'a>(document: &'a Html, property: &str) -> Option<&'a str> {
    let selector = Selector::parse(&format!(r#"meta[property="{property}"]"#)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
}

/// First JSON-LD block describing a person or profile page.
fn json_ld(document: &Html) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    document.select(&selector).find_map(|el| {
        let text: String = el.text().collect();
        let value: Value = serde_json::from_str(&text).ok()?;
        // ProfilePage wraps the person in mainEntity
        let entity = value.get("mainEntity").cloned().unwrap_or(value);
        entity.get("name").is_some().then_some(entity)
    })
}

fn follower_statistic(entity: &Value) -> Option<u64> {
    let stats = entity.get("interactionStatistic")?;
    let stats = match stats {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    };
    stats.into_iter().find_map(|stat| {
        let kind = stat.get("interactionType")?.as_str()?;
        if kind.ends_with("FollowAction") {
            stat.get("userInteractionCount")?.as_u64()
        } else {
            None
        }
    })
}

pub(crate) fn parse_page(
    body: &str,
    identifier: &Identifier,
    base_url: &str,
) -> Result<ProfileRecord> {
    let document = Html::parse_document(body);
    let description = meta_content(&document, "og:description");
    let counters = description.and_then(parse_counters);
    let entity = json_ld(&document);

    if counters.is_none() && entity.is_none() {
        return Err(StrategyError::Parse(
            "no profile metadata in page".to_string(),
        ));
    }

    let mut record = ProfileRecord::success(identifier, base_url, FetchMethod::Library);

    if let Some(counters) = counters {
        record.followers = counters.followers;
        record.following = counters.following;
        record.post_count = counters.posts;
    }
    ProfileRecord::set_text(
        &mut record.display_name,
        meta_content(&document, "og:title").and_then(name_from_title),
    );
    ProfileRecord::set_text(
        &mut record.picture_url,
        meta_content(&document, "og:image"),
    );

    if let Some(entity) = &entity {
        if record.display_name == lantern_core::UNKNOWN {
            ProfileRecord::set_text(
                &mut record.display_name,
                entity.get("name").and_then(Value::as_str),
            );
        }
        ProfileRecord::set_text(
            &mut record.biography,
            entity.get("description").and_then(Value::as_str),
        );
        if record.followers == Count::Unknown {
            record.followers = follower_statistic(entity).into();
        }
    }

    record.is_private = body.contains(PRIVATE_MARKER);
    Ok(record)
}
