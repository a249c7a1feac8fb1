//! Telemetry Poller
//!
//! A spawned interval task fetches `/data` and `/status` concurrently and
//! sends one `PollReport` per tick. It never touches the store. Every
//! `start`/`stop` bumps the generation so reports already queued by an old
//! task can be recognised and dropped.

use crate::backend::DisruptionBackend;
use aero_common::{DataSnapshot, PollingConfig, StatusReport};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Result of one tick; a failed call leaves its field `None`
#[derive(Debug, Clone)]
pub struct PollReport {
    pub generation: u64,
    pub sequence: u64,
    pub page: u32,
    pub data: Option<DataSnapshot>,
    pub status: Option<StatusReport>,
}

impl PollReport {
    pub fn is_complete(&self) -> bool {
        self.data.is_some() && self.status.is_some()
    }
}

/// Issue both calls for one tick; failures are logged and swallowed
pub async fn fetch_report(
    backend: &dyn DisruptionBackend,
    page: u32,
    page_size: u32,
    generation: u64,
    sequence: u64,
) -> PollReport {
    let (data, status) = tokio::join!(
        backend.fetch_data(page, page_size),
        backend.fetch_status()
    );

    let data = data
        .map_err(|e| warn!(page, error = %e, "data poll failed"))
        .ok();
    let status = status
        .map_err(|e| warn!(error = %e, "status poll failed"))
        .ok();

    PollReport {
        generation,
        sequence,
        page,
        data,
        status,
    }
}

pub struct TelemetryPoller {
    backend: Arc<dyn DisruptionBackend>,
    reports: mpsc::Sender<PollReport>,
    interval: Duration,
    page_size: u32,
    generation: u64,
    sequence: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
}

impl TelemetryPoller {
    pub fn new(
        backend: Arc<dyn DisruptionBackend>,
        config: &PollingConfig,
        reports: mpsc::Sender<PollReport>,
    ) -> Self {
        Self {
            backend,
            reports,
            interval: config.interval(),
            page_size: config.page_size,
            generation: 0,
            sequence: Arc::new(AtomicU64::new(0)),
            task: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Sequence the next tick will carry
    pub fn next_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Claim a sequence number for an out-of-band poll
    pub fn claim_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }

    /// Poll `page` immediately and then every interval; restarts if running
    pub fn start(&mut self, page: u32) {
        self.stop();

        let backend = Arc::clone(&self.backend);
        let reports = self.reports.clone();
        let sequence = Arc::clone(&self.sequence);
        let interval = self.interval;
        let page_size = self.page_size;
        let generation = self.generation;

        debug!(page, generation, "poller started");
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let seq = sequence.fetch_add(1, Ordering::SeqCst);
                let report =
                    fetch_report(backend.as_ref(), page, page_size, generation, seq).await;
                if reports.send(report).await.is_err() {
                    debug!("report channel closed, poller exiting");
                    break;
                }
            }
        }));
    }

    /// Cancel the timer; anything still queued becomes stale
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(generation = self.generation, "poller stopped");
        }
        self.generation += 1;
    }

    /// Restart on a new page only if currently running
    pub fn restart_if_running(&mut self, page: u32) {
        if self.is_running() {
            self.start(page);
        } else {
            self.generation += 1;
        }
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
