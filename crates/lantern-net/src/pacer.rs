//! Process-wide outbound request pacer.

use crate::clock::Clock;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Enforces spacing between any two outbound requests.
///
/// Each caller waits until a randomized interval in
/// `[min_interval, max_interval]` has passed since the previous issuance.
/// Callers serialize through the internal lock, so concurrent workers are
/// released one at a time.
pub struct RequestPacer {
    clock: Arc<dyn Clock>,
    min_interval: Duration,
    max_interval: Duration,
    last_issued: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(clock: Arc<dyn Clock>, min_interval: Duration, max_interval: Duration) -> Self {
        Self {
            clock,
            min_interval,
            max_interval: max_interval.max(min_interval),
            last_issued: Mutex::new(None),
        }
    }

    /// Pacer that never waits.
    pub fn unthrottled(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, Duration::ZERO, Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next issuance slot and claim it.
    pub async fn throttle(&self) {
        let mut last = self.last_issued.lock().await;

        if let Some(previous) = *last {
            let spacing = self.next_spacing();
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < spacing {
                let wait = spacing - elapsed;
                tracing::debug!("Pacing outbound request, waiting {:?}", wait);
                self.clock.sleep(wait).await;
            }
        }

        *last = Some(self.clock.now());
    }

    fn next_spacing(&self) -> Duration {
        if self.max_interval <= self.min_interval {
            return self.min_interval;
        }
        let jitter = rand::thread_rng().gen_range(0.0..=1.0);
        self.min_interval + (self.max_interval - self.min_interval).mul_f64(jitter)
    }
}
