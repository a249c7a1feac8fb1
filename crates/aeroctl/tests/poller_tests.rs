//! Poller lifecycle under a paused clock

use aero_common::{PollingConfig, SystemStatus};
use aeroctl::backend::{FakeBackend, FakeFailure};
use aeroctl::orchestrator::{PollReport, TelemetryPoller};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const INTERVAL: Duration = Duration::from_millis(100);

fn poller(fake: Arc<FakeBackend>) -> (TelemetryPoller, mpsc::Receiver<PollReport>) {
    let config = PollingConfig {
        interval_ms: INTERVAL.as_millis() as u64,
        ..Default::default()
    };
    let (tx, rx) = mpsc::channel(8);
    (TelemetryPoller::new(fake, &config, tx), rx)
}

#[tokio::test(start_paused = true)]
async fn test_polls_immediately_then_on_interval() {
    let fake = Arc::new(FakeBackend::new());
    let (mut poller, mut rx) = poller(fake.clone());

    poller.start(1);
    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    let third = rx.recv().await.unwrap();

    assert_eq!(
        [first.sequence, second.sequence, third.sequence],
        [0, 1, 2]
    );
    assert!(first.is_complete());
    assert_eq!(first.page, 1);
    assert_eq!(fake.data_pages(), vec![1, 1, 1]);
    assert_eq!(poller.next_sequence(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_ticks_and_bumps_generation() {
    let fake = Arc::new(FakeBackend::new());
    let (mut poller, mut rx) = poller(fake);

    poller.start(1);
    let report = rx.recv().await.unwrap();
    assert_eq!(report.generation, 0);
    assert!(poller.is_running());

    poller.stop();
    assert!(!poller.is_running());
    assert_eq!(poller.generation(), 1);
    assert!(timeout(INTERVAL * 10, rx.recv()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_page_change_restarts_with_new_generation() {
    let fake = Arc::new(FakeBackend::new());
    let (mut poller, mut rx) = poller(fake);

    poller.start(1);
    let before = rx.recv().await.unwrap();

    poller.restart_if_running(2);
    let after = rx.recv().await.unwrap();

    assert_eq!(after.page, 2);
    assert!(after.generation > before.generation);
    assert!(after.sequence > before.sequence);
}

#[tokio::test(start_paused = true)]
async fn test_restart_while_stopped_stays_stopped() {
    let fake = Arc::new(FakeBackend::new());
    let (mut poller, mut rx) = poller(fake.clone());

    poller.restart_if_running(3);

    assert!(!poller.is_running());
    assert_eq!(poller.generation(), 1);
    assert!(timeout(INTERVAL * 5, rx.recv()).await.is_err());
    assert!(fake.data_pages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_ticks_do_not_overlap() {
    let fake = Arc::new(FakeBackend::new().with_latency(INTERVAL * 5 / 2));
    let (mut poller, mut rx) = poller(fake);

    poller.start(1);
    let mut sequences = Vec::new();
    let _ = timeout(Duration::from_millis(1000), async {
        while let Some(report) = rx.recv().await {
            sequences.push(report.sequence);
        }
    })
    .await;

    assert!(!sequences.is_empty());
    assert!(sequences.len() <= 4, "got {:?}", sequences);
    assert!(sequences.windows(2).all(|w| w[1] == w[0] + 1));
}

#[tokio::test(start_paused = true)]
async fn test_failed_call_leaves_field_empty() {
    let fake = Arc::new(FakeBackend::new());
    fake.set_status(SystemStatus::Critical);
    fake.push_data(Err(FakeFailure::Unreachable));
    let (mut poller, mut rx) = poller(fake);

    poller.start(1);
    let report = rx.recv().await.unwrap();

    assert!(report.data.is_none());
    assert_eq!(report.status.map(|s| s.status), Some(SystemStatus::Critical));
}
