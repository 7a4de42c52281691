//! Post-count bucketing of successful records.

use lantern_core::ProfileRecord;
use serde::Serialize;

/// Highest post count that still lands in the `low` bucket.
pub const LOW_POST_LIMIT: u64 = 5;

/// Successful records split by post count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Classification {
    /// 1 to 5 posts
    pub low: Vec<ProfileRecord>,
    /// More than 5 posts
    pub high: Vec<ProfileRecord>,
    /// Successful records with zero or unreadable post counts
    pub excluded: usize,
}

/// Deterministic, infallible classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultClassifier;

impl ResultClassifier {
    /// Bucket the successful records in `records`.
    ///
    /// Non-success records are ignored and not counted as excluded.
    #[must_use]
    pub fn classify(&self, records: &[ProfileRecord]) -> Classification {
        let mut classification = Classification::default();

        for record in records.iter().filter(|r| r.status.is_success()) {
            match record.post_count.as_u64() {
                Some(0) | None => classification.excluded += 1,
                Some(n) if n <= LOW_POST_LIMIT => classification.low.push(record.clone()),
                Some(_) => classification.high.push(record.clone()),
            }
        }

        classification
    }
}
