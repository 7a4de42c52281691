//! HTTP client seam.
//!
//! Strategies and session probes talk to the platform through the
//! [`HttpClient`] trait. [`ReqwestClient`] is the production implementation;
//! [`PacedClient`] wraps any client so every call first waits on the shared
//! [`RequestPacer`].

use crate::error::{Result, TransportError};
use crate::pacer::RequestPacer;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Request methods used against the platform. Every fetch and probe is a `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
        }
    }
}

/// Outbound request description.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: Vec::new(),
            cookies: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `Cookie` header value, or `None` when no cookies are attached.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Response as seen by the strategies. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// Redirect pointing at the platform's login surface.
    pub fn is_login_redirect(&self) -> bool {
        self.is_redirect()
            && self
                .header("location")
                .is_some_and(|location| location.contains("accounts/login"))
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Transport used for every outbound call.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// `reqwest`-backed client. Redirects are never followed so callers can
/// observe login redirects.
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.as_reqwest();
        let mut builder = self
            .inner
            .request(method.clone(), &request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = request.cookie_header() {
            builder = builder.header(reqwest::header::COOKIE, cookies);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await?;

        tracing::debug!("{} {} -> {}", method, request.url, status);
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Client wrapper that waits on the shared pacer before every call.
#[derive(Clone)]
pub struct PacedClient {
    client: Arc<dyn HttpClient>,
    pacer: Arc<RequestPacer>,
}

impl PacedClient {
    pub fn new(client: Arc<dyn HttpClient>, pacer: Arc<RequestPacer>) -> Self {
        Self { client, pacer }
    }

    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.pacer.throttle().await;
        self.client.request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::ScriptedClient;

    #[test]
    fn test_cookie_header() {
        let mut request = HttpRequest::get("https://example.com/");
        assert!(request.cookie_header().is_none());

        request.cookies.push(("sessionid".to_string(), "abc".to_string()));
        request.cookies.push(("ig_nrcb".to_string(), "1".to_string()));
        assert_eq!(
            request.cookie_header().as_deref(),
            Some("sessionid=abc; ig_nrcb=1")
        );
    }

    #[test]
    fn test_login_redirect_detection() {
        let redirect = HttpResponse::new(302, "")
            .with_header("Location", "https://example.com/accounts/login/?next=/");
        assert!(redirect.is_login_redirect());

        let other = HttpResponse::new(302, "").with_header("Location", "https://example.com/");
        assert!(!other.is_login_redirect());

        let ok = HttpResponse::new(200, "accounts/login");
        assert!(!ok.is_login_redirect());
    }

    #[test]
    fn test_json_body() {
        let response = HttpResponse::new(200, r#"{"data":{"count":3}}"#);
        let value: serde_json::Value = response.json().expect("valid json");
        assert_eq!(value["data"]["count"], 3);
    }

    #[tokio::test]
    async fn test_paced_client_waits_between_calls() {
        let clock = Arc::new(ManualClock::new());
        let pacer = Arc::new(RequestPacer::new(
            clock.clone(),
            Duration::from_secs(2),
            Duration::from_secs(2),
        ));
        let scripted = Arc::new(ScriptedClient::new());
        let client = PacedClient::new(scripted.clone(), pacer);

        tokio_test::assert_ok!(client.send(HttpRequest::get("https://example.com/a")).await);
        tokio_test::assert_ok!(client.send(HttpRequest::get("https://example.com/b")).await);

        assert_eq!(scripted.request_count(), 2);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2)]);
    }
}
