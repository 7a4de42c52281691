//! Fetch strategy implementations.

pub mod api;
pub mod common;
pub mod html;
pub mod library;

pub use api::ApiStrategy;
pub use html::HtmlRegexStrategy;
pub use library::LibraryStrategy;

use crate::strategy::FetchStrategy;
use lantern_core::PlatformConfig;
use lantern_net::PacedClient;
use std::sync::Arc;

/// The standard strategy chain: api, then library, then html_regex.
#[must_use]
pub fn default_strategies(
    client: &PacedClient,
    platform: &PlatformConfig,
) -> Vec<Arc<dyn FetchStrategy>> {
    vec![
        Arc::new(ApiStrategy::new(client.clone(), platform.clone())),
        Arc::new(LibraryStrategy::new(client.clone(), platform.clone())),
        Arc::new(HtmlRegexStrategy::new(client.clone(), platform.clone())),
    ]
}
