//! Bounded-concurrency batch dispatch.
//!
//! Every identifier in a batch runs through the [`FetchPipeline`] with at most
//! `max_workers` fetches in flight. Results are drained by a single consumer,
//! so every input yields exactly one record.

use crate::classifier::{Classification, ResultClassifier};
use crate::pipeline::FetchPipeline;
use futures::stream::{FuturesUnordered, StreamExt};
use lantern_auth::SessionContext;
use lantern_core::{Identifier, LanternError, ProfileRecord, Result, ScrapeStatus, Timestamp};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Aggregate outcome of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    /// Unique batch id
    pub batch_id: Uuid,
    /// Records with status `success`
    pub successful: usize,
    /// Every other non-throttled outcome
    pub failed: usize,
    /// Records with status `rate_limited`
    pub rate_limited: usize,
    /// Number of identifiers submitted
    pub total: usize,
    /// Post-count buckets of the successful records
    pub classification: Classification,
    /// One record per identifier, in submission order
    pub records: Vec<ProfileRecord>,
    /// When dispatch began
    pub started_at: Timestamp,
    /// When the last record was collected
    pub completed_at: Timestamp,
}

impl BatchResult {
    fn from_records(
        batch_id: Uuid,
        records: Vec<ProfileRecord>,
        classifier: ResultClassifier,
        started_at: Timestamp,
    ) -> Self {
        let mut successful = 0;
        let mut failed = 0;
        let mut rate_limited = 0;
        for record in &records {
            match record.status {
                ScrapeStatus::Success => successful += 1,
                ScrapeStatus::RateLimited => rate_limited += 1,
                _ => failed += 1,
            }
        }

        Self {
            batch_id,
            successful,
            failed,
            rate_limited,
            total: records.len(),
            classification: classifier.classify(&records),
            records,
            started_at,
            completed_at: Timestamp::now(),
        }
    }
}

/// Progress of a spawned batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    /// Identifiers with a terminal record
    pub completed: usize,
    /// Identifiers in the batch
    pub total: usize,
}

impl BatchProgress {
    /// Whether every identifier has a terminal record.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Completion signal for a batch running on its own task.
pub struct BatchHandle {
    batch_id: Uuid,
    progress: watch::Receiver<BatchProgress>,
    task: JoinHandle<BatchResult>,
}

impl BatchHandle {
    /// Id shared with the eventual [`BatchResult`].
    #[must_use]
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Latest reported progress.
    pub fn progress(&self) -> BatchProgress {
        *self.progress.borrow()
    }

    /// Receiver for progress updates, for callers that want to await changes.
    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.clone()
    }

    /// Wait for the batch to finish.
    ///
    /// # Errors
    /// Returns `Internal` if the batch task panicked or was cancelled.
    pub async fn wait(self) -> Result<BatchResult> {
        self.task
            .await
            .map_err(|e| LanternError::Internal(format!("batch {} did not complete: {e}", self.batch_id)))
    }
}

/// Runs batches of identifiers through a shared pipeline.
#[derive(Clone)]
pub struct BatchScheduler {
    pipeline: Arc<FetchPipeline>,
    classifier: ResultClassifier,
    max_workers: usize,
}

impl BatchScheduler {
    /// Scheduler running at most `max_workers` fetches at once (minimum 1).
    #[must_use]
    pub fn new(pipeline: Arc<FetchPipeline>, max_workers: usize) -> Self {
        Self {
            pipeline,
            classifier: ResultClassifier,
            max_workers: max_workers.max(1),
        }
    }

    /// Fetch every identifier and wait for the aggregate result.
    pub async fn submit(
        &self,
        identifiers: Vec<Identifier>,
        context: Arc<SessionContext>,
    ) -> BatchResult {
        self.run(Uuid::new_v4(), identifiers, context, None).await
    }

    /// Run the batch on a separate tokio task.
    pub fn spawn(&self, identifiers: Vec<Identifier>, context: Arc<SessionContext>) -> BatchHandle {
        let batch_id = Uuid::new_v4();
        let (tx, rx) = watch::channel(BatchProgress {
            completed: 0,
            total: identifiers.len(),
        });

        let scheduler = self.clone();
        let task = tokio::spawn(async move {
            scheduler
                .run(batch_id, identifiers, context, Some(&tx))
                .await
        });

        BatchHandle {
            batch_id,
            progress: rx,
            task,
        }
    }

    async fn run(
        &self,
        batch_id: Uuid,
        identifiers: Vec<Identifier>,
        context: Arc<SessionContext>,
        progress: Option<&watch::Sender<BatchProgress>>,
    ) -> BatchResult {
        let started_at = Timestamp::now();
        let total = identifiers.len();
        let max_concurrent = self.max_workers.min(total).max(1);

        tracing::info!(
            "Starting batch {} with {} identifiers ({} workers)",
            batch_id,
            total,
            max_concurrent
        );

        let mut futures = FuturesUnordered::new();
        let mut slots: Vec<Option<ProfileRecord>> = vec![None; total];
        let mut completed = 0;

        let mut collect = |(index, record): (usize, ProfileRecord)| {
            slots[index] = Some(record);
            completed += 1;
            if let Some(tx) = progress {
                tx.send_replace(BatchProgress { completed, total });
            }
        };

        for (index, identifier) in identifiers.into_iter().enumerate() {
            let pipeline = &self.pipeline;
            let context = &context;
            futures.push(async move {
                let record = pipeline.fetch(&identifier, context).await;
                (index, record)
            });

            // Respect concurrency limit
            while futures.len() >= max_concurrent {
                if let Some(done) = futures.next().await {
                    collect(done);
                }
            }
        }

        // Collect remaining results
        while let Some(done) = futures.next().await {
            collect(done);
        }

        let records: Vec<ProfileRecord> = slots.into_iter().flatten().collect();
        let result = BatchResult::from_records(batch_id, records, self.classifier, started_at);

        tracing::info!(
            "Batch {} complete: {} successful, {} failed, {} rate limited",
            batch_id,
            result.successful,
            result.failed,
            result.rate_limited
        );
        result
    }
}
