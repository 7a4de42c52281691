//! Outbound networking for Lantern.
//!
//! Provides the HTTP client seam used by every fetch strategy, a process-wide
//! request pacer, a per-key quota limiter and browser-like request headers.

pub mod client;
pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod pacer;
pub mod quota;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, PacedClient, ReqwestClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TransportError};
pub use fingerprint::HeaderProfile;
pub use pacer::RequestPacer;
pub use quota::QuotaLimiter;
