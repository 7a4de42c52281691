//! Lantern Authentication Layer
//!
//! Emulates a logged-in identity on the remote platform. A raw session token
//! is validated into a [`SessionCredential`], turned into a shared
//! [`SessionContext`] carrying the cookie and header set for authenticated
//! calls, and kept honest by the [`AuthSessionManager`].
//!
//! # Session lifecycle
//!
//! 1. **Establish**: credential shape is checked locally, no network call
//! 2. **Verify**: one or two probe requests through the shared pacer
//! 3. **Invalidate**: any fetch worker that sees an authentication failure
//!    flips the shared context with a compare-and-swap, so every later fetch
//!    stops before touching the network
//!
//! Token material is zeroized from memory when the credential is dropped.

pub mod context;
pub mod credential;
pub mod manager;

pub use context::{SessionContext, SessionState};
pub use credential::SessionCredential;
pub use manager::{AuthSessionManager, Confidence, SessionStatus};
