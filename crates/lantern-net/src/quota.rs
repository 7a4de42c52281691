//! Sliding-window request quota per caller key.

use crate::clock::Clock;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Bounds the number of admitted requests per key within a trailing window.
///
/// Hits older than the window are pruned lazily on every check.
pub struct QuotaLimiter {
    clock: Arc<dyn Clock>,
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl QuotaLimiter {
    pub fn new(clock: Arc<dyn Clock>, max_requests: u32, window: Duration) -> Self {
        Self {
            clock,
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit for `key`; returns `false` once the window is full.
    ///
    /// Rejected calls are not recorded.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let mut hits = self.lock();
        let entry = hits.entry(key.to_string()).or_default();
        self.prune(entry, now);

        if entry.len() >= self.max_requests as usize {
            tracing::warn!("Quota exceeded for {}", key);
            return false;
        }

        entry.push_back(now);
        true
    }

    /// Requests still admitted for `key` in the current window.
    pub fn remaining(&self, key: &str) -> u32 {
        let now = self.clock.now();
        let mut hits = self.lock();
        let Some(entry) = hits.get_mut(key) else {
            return self.max_requests;
        };
        self.prune(entry, now);

        let used = u32::try_from(entry.len()).unwrap_or(u32::MAX);
        self.max_requests.saturating_sub(used)
    }

    /// Time until the oldest hit leaves the window, if the key is exhausted.
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let mut hits = self.lock();
        let entry = hits.get_mut(key)?;
        self.prune(entry, now);

        if entry.len() < self.max_requests as usize {
            return None;
        }
        entry
            .front()
            .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
    }

    fn prune(&self, entry: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = entry.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
