//! Structured profile endpoint strategy.

use super::common::fetch;
use crate::error::{Result, StrategyError};
use crate::strategy::FetchStrategy;
use async_trait::async_trait;
use lantern_auth::SessionContext;
use lantern_core::{Count, FetchMethod, Identifier, PlatformConfig, ProfileRecord};
use lantern_net::PacedClient;
use serde::Deserialize;

/// Reads the platform's `web_profile_info` JSON endpoint.
pub struct ApiStrategy {
    client: PacedClient,
    platform: PlatformConfig,
}

impl ApiStrategy {
    /// Strategy sending its requests through `client`.
    #[must_use]
    pub fn new(client: PacedClient, platform: PlatformConfig) -> Self {
        Self { client, platform }
    }
}

#[async_trait]
impl FetchStrategy for ApiStrategy {
    fn method(&self) -> FetchMethod {
        FetchMethod::Api
    }

    async fn attempt(
        &self,
        identifier: &Identifier,
        context: &SessionContext,
    ) -> Result<ProfileRecord> {
        let url = self.platform.profile_api_url(identifier.as_str());
        let response = fetch(&self.client, context, url).await?;
        parse_profile(&response.body, identifier, self.platform.base())
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: Option<ProfileData>,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    full_name: Option<String>,
    biography: Option<String>,
    edge_followed_by: Option<EdgeCount>,
    edge_follow: Option<EdgeCount>,
    edge_owner_to_timeline_media: Option<EdgeCount>,
    #[serde(default)]
    is_verified: bool,
    #[serde(default)]
    is_private: bool,
    external_url: Option<String>,
    profile_pic_url_hd: Option<String>,
    profile_pic_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdgeCount {
    count: Option<u64>,
}

fn edge(count: Option<&EdgeCount>) -> Count {
    count.and_then(|c| c.count).into()
}

pub(crate) fn parse_profile(
    body: &str,
    identifier: &Identifier,
    base_url: &str,
) -> Result<ProfileRecord> {
    let parsed: ProfileResponse = serde_json::from_str(body)
        .map_err(|e| StrategyError::Parse(format!("profile JSON: {e}")))?;
    let user = parsed
        .data
        .and_then(|d| d.user)
        .ok_or(StrategyError::NotFound)?;

    let mut record = ProfileRecord::success(identifier, base_url, FetchMethod::Api);
    ProfileRecord::set_text(&mut record.display_name, user.full_name.as_deref());
    ProfileRecord::set_text(&mut record.biography, user.biography.as_deref());
    ProfileRecord::set_text(&mut record.external_url, user.external_url.as_deref());
    ProfileRecord::set_text(
        &mut record.picture_url,
        user.profile_pic_url_hd
            .as_deref()
            .or(user.profile_pic_url.as_deref()),
    );
    record.followers = edge(user.edge_followed_by.as_ref());
    record.following = edge(user.edge_follow.as_ref());
    record.post_count = edge(user.edge_owner_to_timeline_media.as_ref());
    record.is_verified = user.is_verified;
    record.is_private = user.is_private;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::UNKNOWN;

    const BASE: &str = "https://platform.test";

    fn alice() -> Identifier {
        Identifier::parse("alice").expect("valid identifier")
    }

    #[test]
    fn test_parse_full_profile() {
        let body = r#"{"data":{"user":{
            "full_name":"Alice Liddell",
            "biography":"Down the rabbit hole",
            "edge_followed_by":{"count":1234},
            "edge_follow":{"count":56},
            "edge_owner_to_timeline_media":{"count":7,"edges":[]},
            "is_verified":true,
            "is_private":false,
            "external_url":"https://alice.example",
            "profile_pic_url_hd":"https://cdn.example/alice_hd.jpg",
            "profile_pic_url":"https://cdn.example/alice.jpg"
        }},"status":"ok"}"#;

        let record = parse_profile(body, &alice(), BASE).expect("parsed");

        assert_eq!(record.display_name, "Alice Liddell");
        assert_eq!(record.followers, Count::Exact(1234));
        assert_eq!(record.following, Count::Exact(56));
        assert_eq!(record.post_count, Count::Exact(7));
        assert!(record.is_verified);
        assert_eq!(record.picture_url, "https://cdn.example/alice_hd.jpg");
        assert_eq!(record.profile_url, "https://platform.test/alice/");
        assert_eq!(record.method, FetchMethod::Api);
    }

    #[test]
    fn test_missing_fields_use_sentinels() {
        let body = r#"{"data":{"user":{"full_name":"","biography":null}}}"#;

        let record = parse_profile(body, &alice(), BASE).expect("parsed");

        assert_eq!(record.display_name, UNKNOWN);
        assert_eq!(record.biography, UNKNOWN);
        assert_eq!(record.followers, Count::Unknown);
        assert!(!record.is_private);
    }

    #[test]
    fn test_null_user_is_not_found() {
        let body = r#"{"data":{"user":null},"status":"ok"}"#;
        assert!(matches!(
            parse_profile(body, &alice(), BASE),
            Err(StrategyError::NotFound)
        ));
    }

    #[test]
    fn test_html_body_is_parse_error() {
        assert!(matches!(
            parse_profile("<html></html>", &alice(), BASE),
            Err(StrategyError::Parse(_))
        ));
    }
}
