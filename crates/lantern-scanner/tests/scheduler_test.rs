//! Worker bound of the batch scheduler.

use async_trait::async_trait;
use lantern_auth::{AuthSessionManager, SessionContext};
use lantern_core::{FetchMethod, Identifier, PlatformConfig, ProfileRecord};
use lantern_net::testing::ScriptedClient;
use lantern_net::{ManualClock, PacedClient, RequestPacer};
use lantern_scanner::{BatchScheduler, FetchPipeline, FetchStrategy, RetryPolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const BASE: &str = "https://platform.test";
const SESSION_ID: &str = "1234567890:AbCdEfGhIjKl:12:AYc";

/// Succeeds after yielding a few times, tracking how many calls overlap.
#[derive(Default)]
struct Overlapping {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[async_trait]
impl FetchStrategy for Overlapping {
    fn method(&self) -> FetchMethod {
        FetchMethod::Api
    }

    async fn attempt(
        &self,
        identifier: &Identifier,
        _context: &SessionContext,
    ) -> lantern_scanner::Result<ProfileRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ProfileRecord::success(identifier, BASE, FetchMethod::Api))
    }
}

fn setup(max_workers: usize) -> (BatchScheduler, Arc<Overlapping>, Arc<SessionContext>) {
    let clock = Arc::new(ManualClock::new());
    let pacer = Arc::new(RequestPacer::unthrottled(clock.clone()));
    let client = PacedClient::new(Arc::new(ScriptedClient::new()), pacer);
    let platform = PlatformConfig {
        base_url: BASE.to_string(),
        ..PlatformConfig::default()
    };
    let auth = Arc::new(AuthSessionManager::new(
        client,
        platform,
        Duration::from_secs(5),
    ));
    let context = auth.establish(SESSION_ID, None).expect("valid session");

    let strategy = Arc::new(Overlapping::default());
    let pipeline = FetchPipeline::new(
        vec![strategy.clone() as Arc<dyn FetchStrategy>],
        RetryPolicy::new(3, Duration::from_secs(1)),
        clock,
        auth,
        BASE,
    );
    (
        BatchScheduler::new(Arc::new(pipeline), max_workers),
        strategy,
        context,
    )
}

fn identifiers(count: usize) -> Vec<Identifier> {
    (0..count)
        .map(|i| Identifier::parse(&format!("user_{i}")).expect("valid identifier"))
        .collect()
}

#[tokio::test]
async fn test_in_flight_fetches_capped_at_worker_count() {
    let (scheduler, strategy, context) = setup(3);

    let result = scheduler.submit(identifiers(10), context).await;

    assert_eq!(result.successful, 10);
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 10);
    assert_eq!(strategy.peak.load(Ordering::SeqCst), 3);
    assert_eq!(strategy.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_small_batch_runs_every_fetch_at_once() {
    let (scheduler, strategy, context) = setup(8);

    let result = scheduler.submit(identifiers(2), context).await;

    assert_eq!(result.total, 2);
    assert_eq!(strategy.peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_single_worker_runs_sequentially() {
    let (scheduler, strategy, context) = setup(1);

    let result = scheduler.submit(identifiers(4), context).await;

    assert_eq!(result.successful, 4);
    assert_eq!(strategy.peak.load(Ordering::SeqCst), 1);
    let order: Vec<&str> = result.records.iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(order, vec!["user_0", "user_1", "user_2", "user_3"]);
}
