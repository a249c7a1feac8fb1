//! Scripted backend for deterministic testing
//!
//! Each endpoint has a lane: a queue of scripted replies and a fallback that
//! is returned once the queue is drained. Every call is journaled.
//!
//! ```rust,ignore
//! let fake = FakeBackend::new();
//! fake.script_statuses([SystemStatus::Valid, SystemStatus::Critical]);
//! fake.push_heal(Ok(options_response()));
//! fake.push_resolve(Err(FakeFailure::Status(500, "db down".into())));
//! ```

use super::DisruptionBackend;
use aero_common::{
    endpoints, AeroError, Ack, DataSnapshot, HealResponse, OrchestratorMode, OvertimeQuote,
    OvertimeQuoteRequest, ResolutionOption, SimulationRequest, StatusReport, SystemStatus,
    HEAL_NO_ACTION,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const FAKE_URL: &str = "fake://backend";

/// Failure a scripted reply can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeFailure {
    Unreachable,
    Status(u16, String),
    Malformed,
}

impl FakeFailure {
    fn into_error(self, endpoint: &str) -> AeroError {
        match self {
            FakeFailure::Unreachable => AeroError::Unreachable {
                url: FAKE_URL.to_string(),
                message: "connection refused".to_string(),
            },
            FakeFailure::Status(status, body) => AeroError::Backend {
                endpoint: endpoint.to_string(),
                status,
                body,
            },
            FakeFailure::Malformed => AeroError::Decode {
                endpoint: endpoint.to_string(),
                message: "expected value at line 1 column 1".to_string(),
            },
        }
    }
}

/// Journal entry for one backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Data { page: u32, limit: u32 },
    Status,
    Heal(OrchestratorMode),
    Resolve(ResolutionOption),
    Simulate(SimulationRequest),
    Seed,
    GrantRest(String),
    QuoteOvertime(OvertimeQuoteRequest),
}

type Reply<T> = Result<T, FakeFailure>;

struct Lane<T: Clone> {
    queue: VecDeque<Reply<T>>,
    fallback: Reply<T>,
}

impl<T: Clone> Lane<T> {
    fn new(fallback: T) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: Ok(fallback),
        }
    }

    fn next(&mut self) -> Reply<T> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct Script {
    data: Lane<DataSnapshot>,
    status: Lane<StatusReport>,
    heal: Lane<HealResponse>,
    resolve: Lane<Ack>,
    simulate: Lane<Ack>,
    seed: Lane<Ack>,
    rest: Lane<Ack>,
    quote: Lane<OvertimeQuote>,
}

fn ack(status: &str) -> Ack {
    Ack {
        status: Some(status.to_string()),
        message: None,
    }
}

impl Default for Script {
    fn default() -> Self {
        Self {
            data: Lane::new(DataSnapshot::default()),
            status: Lane::new(StatusReport::new(SystemStatus::Valid)),
            heal: Lane::new(HealResponse {
                status: HEAL_NO_ACTION.to_string(),
                ..Default::default()
            }),
            resolve: Lane::new(ack("RESOLVED")),
            simulate: Lane::new(ack("CRISIS_INJECTED")),
            seed: Lane::new(ack("SEEDED")),
            rest: Lane::new(ack("UPDATED")),
            quote: Lane::new(OvertimeQuote::default()),
        }
    }
}

/// Fake backend with scripted replies and a call journal
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
    journal: Mutex<Vec<BackendCall>>,
    latency: Mutex<Option<Duration>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every reply; pairs with `tokio::time::pause` in tests
    pub fn with_latency(self, latency: Duration) -> Self {
        *lock(&self.latency) = Some(latency);
        self
    }

    // ------------------------------------------------------------------
    // Scripting
    // ------------------------------------------------------------------

    pub fn push_data(&self, reply: Reply<DataSnapshot>) {
        lock(&self.script).data.queue.push_back(reply);
    }

    pub fn push_status(&self, reply: Reply<StatusReport>) {
        lock(&self.script).status.queue.push_back(reply);
    }

    /// Queue one successful status reply per entry
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = SystemStatus>) {
        let mut script = lock(&self.script);
        for status in statuses {
            script.status.queue.push_back(Ok(StatusReport::new(status)));
        }
    }

    /// Status returned once the queue is drained
    pub fn set_status(&self, status: SystemStatus) {
        lock(&self.script).status.fallback = Ok(StatusReport::new(status));
    }

    pub fn set_data(&self, snapshot: DataSnapshot) {
        lock(&self.script).data.fallback = Ok(snapshot);
    }

    pub fn push_heal(&self, reply: Reply<HealResponse>) {
        lock(&self.script).heal.queue.push_back(reply);
    }

    pub fn set_heal(&self, reply: Reply<HealResponse>) {
        lock(&self.script).heal.fallback = reply;
    }

    pub fn push_resolve(&self, reply: Reply<Ack>) {
        lock(&self.script).resolve.queue.push_back(reply);
    }

    pub fn push_simulate(&self, reply: Reply<Ack>) {
        lock(&self.script).simulate.queue.push_back(reply);
    }

    pub fn push_seed(&self, reply: Reply<Ack>) {
        lock(&self.script).seed.queue.push_back(reply);
    }

    pub fn push_rest(&self, reply: Reply<Ack>) {
        lock(&self.script).rest.queue.push_back(reply);
    }

    pub fn push_quote(&self, reply: Reply<OvertimeQuote>) {
        lock(&self.script).quote.queue.push_back(reply);
    }

    // ------------------------------------------------------------------
    // Journal
    // ------------------------------------------------------------------

    pub fn calls(&self) -> Vec<BackendCall> {
        lock(&self.journal).clone()
    }

    pub fn heal_calls(&self) -> usize {
        lock(&self.journal)
            .iter()
            .filter(|call| matches!(call, BackendCall::Heal(_)))
            .count()
    }

    /// Options sent to `/resolve`, in order
    pub fn resolved_options(&self) -> Vec<ResolutionOption> {
        lock(&self.journal)
            .iter()
            .filter_map(|call| match call {
                BackendCall::Resolve(option) => Some(option.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn data_pages(&self) -> Vec<u32> {
        lock(&self.journal)
            .iter()
            .filter_map(|call| match call {
                BackendCall::Data { page, .. } => Some(*page),
                _ => None,
            })
            .collect()
    }

    pub fn clear_journal(&self) {
        lock(&self.journal).clear();
    }

    async fn record(&self, call: BackendCall) {
        lock(&self.journal).push(call);
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DisruptionBackend for FakeBackend {
    async fn fetch_data(&self, page: u32, limit: u32) -> Result<DataSnapshot, AeroError> {
        self.record(BackendCall::Data { page, limit }).await;
        let reply = lock(&self.script).data.next();
        reply.map_err(|f| f.into_error(endpoints::DATA))
    }

    async fn fetch_status(&self) -> Result<StatusReport, AeroError> {
        self.record(BackendCall::Status).await;
        let reply = lock(&self.script).status.next();
        reply.map_err(|f| f.into_error(endpoints::STATUS))
    }

    async fn heal(&self, mode: OrchestratorMode) -> Result<HealResponse, AeroError> {
        self.record(BackendCall::Heal(mode)).await;
        let reply = lock(&self.script).heal.next();
        reply.map_err(|f| f.into_error(endpoints::HEAL))
    }

    async fn resolve(&self, option: &ResolutionOption) -> Result<Ack, AeroError> {
        self.record(BackendCall::Resolve(option.clone())).await;
        let reply = lock(&self.script).resolve.next();
        reply.map_err(|f| f.into_error(endpoints::RESOLVE))
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<Ack, AeroError> {
        self.record(BackendCall::Simulate(request.clone())).await;
        let reply = lock(&self.script).simulate.next();
        reply.map_err(|f| f.into_error(endpoints::SIMULATE))
    }

    async fn seed(&self) -> Result<Ack, AeroError> {
        self.record(BackendCall::Seed).await;
        let reply = lock(&self.script).seed.next();
        reply.map_err(|f| f.into_error(endpoints::SEED))
    }

    async fn grant_rest(&self, pilot_id: &str) -> Result<Ack, AeroError> {
        self.record(BackendCall::GrantRest(pilot_id.to_string()))
            .await;
        let reply = lock(&self.script).rest.next();
        reply.map_err(|f| f.into_error(endpoints::CREW_REST))
    }

    async fn quote_overtime(
        &self,
        request: &OvertimeQuoteRequest,
    ) -> Result<OvertimeQuote, AeroError> {
        self.record(BackendCall::QuoteOvertime(request.clone()))
            .await;
        let reply = lock(&self.script).quote.next();
        reply.map_err(|f| f.into_error(endpoints::CREW_COST))
    }

    fn describe(&self) -> String {
        FAKE_URL.to_string()
    }
}
