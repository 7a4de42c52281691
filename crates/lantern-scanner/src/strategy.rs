//! Fetch strategy trait.

use crate::error::Result;
use async_trait::async_trait;
use lantern_auth::SessionContext;
use lantern_core::{FetchMethod, Identifier, ProfileRecord};

/// One way of turning an identifier into a [`ProfileRecord`].
///
/// Implementations make their network calls through a paced client and
/// classify every failure as a [`StrategyError`](crate::StrategyError) so the
/// pipeline can decide between retrying, falling back and stopping.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Method tag written to records produced by this strategy.
    fn method(&self) -> FetchMethod;

    /// Make one attempt at fetching `identifier`.
    ///
    /// # Errors
    /// Returns the classified failure of this attempt.
    async fn attempt(
        &self,
        identifier: &Identifier,
        context: &SessionContext,
    ) -> Result<ProfileRecord>;
}
