use futures::future::join_all;
use lantern_net::{
    Clock, HttpClient, HttpRequest, HttpResponse, ManualClock, PacedClient, RequestPacer,
    TransportError,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Records the virtual instant at which each request reaches the transport.
struct IssuanceRecorder {
    clock: Arc<ManualClock>,
    issued: Mutex<Vec<Instant>>,
}

#[async_trait::async_trait]
impl HttpClient for IssuanceRecorder {
    async fn request(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.issued.lock().unwrap().push(self.clock.now());
        Ok(HttpResponse::new(200, "ok"))
    }
}

fn min_gap(mut issued: Vec<Instant>) -> Duration {
    issued.sort();
    issued
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .min()
        .unwrap_or(Duration::MAX)
}

#[tokio::test]
async fn test_concurrent_callers_never_issue_closer_than_min_interval() {
    let clock = Arc::new(ManualClock::new());
    let recorder = Arc::new(IssuanceRecorder {
        clock: clock.clone(),
        issued: Mutex::new(Vec::new()),
    });
    let pacer = Arc::new(RequestPacer::new(
        clock.clone(),
        Duration::from_secs(2),
        Duration::from_secs(5),
    ));
    let client = PacedClient::new(recorder.clone(), pacer);

    let calls = (0..10).map(|i| {
        let client = client.clone();
        async move {
            client
                .send(HttpRequest::get(format!("https://example.com/{i}")))
                .await
        }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    let issued = recorder.issued.lock().unwrap().clone();
    assert_eq!(issued.len(), 10);
    assert!(min_gap(issued) >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_spawned_workers_share_the_pacer() {
    let clock = Arc::new(ManualClock::new());
    let recorder = Arc::new(IssuanceRecorder {
        clock: clock.clone(),
        issued: Mutex::new(Vec::new()),
    });
    let pacer = Arc::new(RequestPacer::new(
        clock.clone(),
        Duration::from_secs(1),
        Duration::from_secs(1),
    ));
    let client = PacedClient::new(recorder.clone(), pacer);

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let client = client.clone();
            tokio::spawn(async move {
                for i in 0..3 {
                    client
                        .send(HttpRequest::get(format!("https://example.com/{worker}/{i}")))
                        .await
                        .expect("scripted reply");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("worker task");
    }

    let issued = recorder.issued.lock().unwrap().clone();
    assert_eq!(issued.len(), 12);
    assert!(min_gap(issued) >= Duration::from_secs(1));
}
