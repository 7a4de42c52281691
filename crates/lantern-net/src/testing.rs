//! Scripted HTTP client for tests.
//!
//! Replies are matched by URL substring; when several patterns match, the
//! longest wins. Each route replays its replies in order and keeps repeating
//! the last one. Unmatched URLs get an empty 404.

use crate::client::{HttpClient, HttpRequest, HttpResponse};
use crate::error::{Result, TransportError};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type Reply = Result<HttpResponse>;

struct Route {
    pattern: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
pub struct ScriptedClient {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<HttpRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn route(self, pattern: &str, replies: Vec<Reply>) -> Self {
        self.add_route(pattern, replies);
        self
    }

    pub fn add_route(&self, pattern: &str, replies: Vec<Reply>) {
        lock(&self.routes).push(Route {
            pattern: pattern.to_string(),
            replies: replies.into(),
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.log).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.log).len()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        lock(&self.log)
            .iter()
            .filter(|r| r.url.contains(pattern))
            .count()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedClient {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        lock(&self.log).push(request);

        let mut routes = lock(&self.routes);
        let route = routes
            .iter_mut()
            .filter(|route| url.contains(&route.pattern))
            .max_by_key(|route| route.pattern.len());

        match route {
            Some(route) if route.replies.len() > 1 => route
                .replies
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, ""))),
            Some(route) => route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(HttpResponse::new(404, ""))),
            None => Ok(HttpResponse::new(404, "")),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn ok(body: impl Into<String>) -> Reply {
    Ok(HttpResponse::new(200, body))
}

pub fn status(code: u16) -> Reply {
    Ok(HttpResponse::new(code, ""))
}

pub fn redirect(location: &str) -> Reply {
    Ok(HttpResponse::new(302, "").with_header("location", location))
}

pub fn timeout() -> Reply {
    Err(TransportError::Timeout("scripted timeout".to_string()))
}
