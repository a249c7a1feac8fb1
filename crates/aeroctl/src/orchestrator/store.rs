//! State Store
//!
//! Holds the latest snapshot plus the transient resolution sub-state.
//! Snapshot fields are written only from poll reports; the flow controller
//! owns `flow`. The runtime is the only writer.

use super::flow::FlowController;
use aero_common::{
    AgentNode, DataSnapshot, FlightRecord, LogEntry, OrchestratorConfig, OrchestratorMode,
    PilotRecord, StatusReport, SystemStatus,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub type SharedStore = Arc<RwLock<StateStore>>;

#[derive(Debug)]
pub struct StateStore {
    flights: Vec<FlightRecord>,
    pilots: Vec<PilotRecord>,
    logs: Vec<LogEntry>,
    total_flights: u64,
    status: SystemStatus,
    status_details: Option<String>,
    page: u32,
    mode: OrchestratorMode,
    agent_nodes: Vec<AgentNode>,
    data_updated_at: Option<DateTime<Utc>>,
    status_updated_at: Option<DateTime<Utc>>,
    /// Resolution sub-state
    pub flow: FlowController,
}

impl StateStore {
    pub fn new(mode: OrchestratorMode, page: u32, orchestrator: &OrchestratorConfig) -> Self {
        Self {
            flights: Vec::new(),
            pilots: Vec::new(),
            logs: Vec::new(),
            total_flights: 0,
            status: SystemStatus::default(),
            status_details: None,
            page: page.max(1),
            mode,
            agent_nodes: Vec::new(),
            data_updated_at: None,
            status_updated_at: None,
            flow: FlowController::new(orchestrator),
        }
    }

    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // ========================================================================
    // Poller writes
    // ========================================================================

    /// Replace flights, pilots, logs and total wholesale
    pub fn apply_data(&mut self, snapshot: DataSnapshot) {
        for flight in snapshot.flights.iter().filter(|f| !f.is_consistent()) {
            warn!(
                flight = flight.reference(),
                status = %flight.status,
                "flight status disagrees with pilot assignment"
            );
        }

        self.flights = snapshot.flights;
        self.pilots = snapshot.pilot_readiness;
        self.logs = snapshot
            .agent_logs
            .into_iter()
            .enumerate()
            .map(|(index, message)| LogEntry { index, message })
            .collect();
        self.total_flights = snapshot.total_flights;
        self.data_updated_at = Some(Utc::now());
    }

    pub fn apply_status(&mut self, report: StatusReport) {
        self.status = report.status;
        self.status_details = report.details;
        self.status_updated_at = Some(Utc::now());
    }

    // ========================================================================
    // Runtime writes
    // ========================================================================

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn set_mode(&mut self, mode: OrchestratorMode) {
        self.mode = mode;
    }

    pub fn set_agent_nodes(&mut self, nodes: Vec<AgentNode>) {
        self.agent_nodes = nodes;
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn flights(&self) -> &[FlightRecord] {
        &self.flights
    }

    pub fn pilots(&self) -> &[PilotRecord] {
        &self.pilots
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Log entries at or after `index`
    pub fn logs_since(&self, index: usize) -> &[LogEntry] {
        self.logs.get(index..).unwrap_or(&[])
    }

    pub fn log_messages(&self) -> Vec<&str> {
        self.logs.iter().map(|entry| entry.message.as_str()).collect()
    }

    pub fn total_flights(&self) -> u64 {
        self.total_flights
    }

    pub fn status(&self) -> &SystemStatus {
        &self.status
    }

    pub fn status_details(&self) -> Option<&str> {
        self.status_details.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn mode(&self) -> OrchestratorMode {
        self.mode
    }

    pub fn agent_nodes(&self) -> &[AgentNode] {
        &self.agent_nodes
    }

    pub fn data_updated_at(&self) -> Option<DateTime<Utc>> {
        self.data_updated_at
    }

    pub fn status_updated_at(&self) -> Option<DateTime<Utc>> {
        self.status_updated_at
    }

    pub fn high_risk_pilots(&self) -> impl Iterator<Item = &PilotRecord> {
        self.pilots.iter().filter(|p| p.is_high_risk())
    }

    pub fn disrupted_flights(&self) -> impl Iterator<Item = &FlightRecord> {
        self.flights.iter().filter(|f| f.status.is_disrupted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aero_common::FlightStatus;

    fn store() -> StateStore {
        StateStore::new(OrchestratorMode::Auto, 1, &OrchestratorConfig::default())
    }

    fn flight(id: &str) -> FlightRecord {
        FlightRecord {
            flight_number: id.to_string(),
            assigned_pilot: Some("P-1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_snapshot_replaces_wholesale() {
        let mut store = store();
        store.apply_data(DataSnapshot {
            flights: vec![flight("F1"), flight("F2")],
            agent_logs: vec!["a".into(), "b".into()],
            total_flights: 2,
            ..Default::default()
        });
        store.apply_data(DataSnapshot {
            flights: vec![flight("F3")],
            agent_logs: vec!["a".into(), "b".into(), "c".into()],
            total_flights: 1,
            ..Default::default()
        });

        assert_eq!(store.flights().len(), 1);
        assert_eq!(store.flights()[0].flight_number, "F3");
        assert_eq!(store.total_flights(), 1);
        assert_eq!(store.logs_since(2)[0].message, "c");
        assert!(store.logs_since(10).is_empty());
    }

    #[test]
    fn test_status_and_details() {
        let mut store = store();
        assert!(store.status().is_nominal());
        store.apply_status(StatusReport {
            status: SystemStatus::Infeasible,
            details: Some("2 Critical Events".into()),
        });
        assert_eq!(store.status(), &SystemStatus::Infeasible);
        assert_eq!(store.status_details(), Some("2 Critical Events"));
        assert!(store.status_updated_at().is_some());
    }

    #[test]
    fn test_page_never_zero() {
        let mut store = store();
        store.set_page(0);
        assert_eq!(store.page(), 1);
    }

    #[test]
    fn test_disrupted_filter() {
        let mut store = store();
        let mut delayed = flight("F9");
        delayed.status = FlightStatus::Delayed;
        store.apply_data(DataSnapshot {
            flights: vec![flight("F1"), delayed],
            ..Default::default()
        });
        let disrupted: Vec<_> = store.disrupted_flights().collect();
        assert_eq!(disrupted.len(), 1);
        assert_eq!(disrupted[0].flight_number, "F9");
    }
}
