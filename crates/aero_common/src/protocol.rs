//! Backend wire protocol: request and response bodies for each endpoint.
//!
//! Every response field is optional on decode; the backend omits fields
//! freely between revisions.

use crate::model::{
    FlightRecord, OrchestratorMode, PilotRecord, RecommendationPacket, ResolutionOption,
    SustainabilityImpact, SystemStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Endpoint paths relative to the backend base URL
pub mod endpoints {
    pub const DATA: &str = "/data";
    pub const STATUS: &str = "/status";
    pub const HEAL: &str = "/heal";
    pub const RESOLVE: &str = "/resolve";
    pub const SIMULATE: &str = "/simulate";
    pub const SEED: &str = "/seed";
    pub const CREW_REST: &str = "/crew/update_rest";
    pub const CREW_COST: &str = "/crew/calculate_cost";
}

/// Heal response status strings
pub const HEAL_HEALED: &str = "HEALED";
pub const HEAL_OPTIONS_GENERATED: &str = "OPTIONS_GENERATED";
pub const HEAL_NO_ACTION: &str = "NO_ACTION";

// ============================================================================
// Telemetry
// ============================================================================

/// `GET /data?page=&limit=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DataSnapshot {
    #[serde(default)]
    pub pilot_readiness: Vec<PilotRecord>,

    #[serde(default)]
    pub flights: Vec<FlightRecord>,

    #[serde(default)]
    pub agent_logs: Vec<String>,

    #[serde(default)]
    pub total_flights: u64,
}

/// `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default = "unknown_status")]
    pub status: SystemStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn unknown_status() -> SystemStatus {
    SystemStatus::Unknown
}

impl StatusReport {
    pub fn new(status: SystemStatus) -> Self {
        Self {
            status,
            details: None,
        }
    }
}

// ============================================================================
// Healing
// ============================================================================

/// `POST /heal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealRequest {
    pub mode: OrchestratorMode,
}

/// Pipeline node reported alongside generated options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentNode {
    pub id: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub status: String,
}

/// Raw `/heal` response, classified by the healing client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HealResponse {
    #[serde(default)]
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ResolutionOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_strategy: Option<ResolutionOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_trace: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sustainability_impact: Option<SustainabilityImpact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_nodes: Option<Vec<AgentNode>>,
}

impl HealResponse {
    /// Recommendation bundled from the flat response fields
    pub fn recommendation(&self) -> Option<RecommendationPacket> {
        self.recommended_strategy
            .clone()
            .map(|recommended_strategy| RecommendationPacket {
                recommended_strategy,
                reasoning_trace: self.reasoning_trace.clone().unwrap_or_default(),
                sustainability_impact: self.sustainability_impact.clone(),
            })
    }
}

/// `POST /resolve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub option: ResolutionOption,
}

/// Generic acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ack {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl Ack {
    /// Some endpoints answer 200 with `{"status": "ERROR"}`
    pub fn is_error(&self) -> bool {
        self.status
            .as_deref()
            .map_or(false, |s| s.eq_ignore_ascii_case("ERROR"))
    }

    pub fn summary(&self) -> String {
        match (&self.status, &self.message) {
            (Some(status), Some(message)) => format!("{}: {}", status, message),
            (Some(status), None) => status.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "ok".to_string(),
        }
    }
}

// ============================================================================
// Simulation
// ============================================================================

/// Disruption category accepted by `/simulate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DisruptionKind {
    Technical,
    Weather,
    Atc,
    Crew,
    Other(String),
}

impl DisruptionKind {
    pub fn as_str(&self) -> &str {
        match self {
            DisruptionKind::Technical => "TECHNICAL",
            DisruptionKind::Weather => "WEATHER",
            DisruptionKind::Atc => "ATC",
            DisruptionKind::Crew => "CREW",
            DisruptionKind::Other(raw) => raw,
        }
    }
}

impl From<String> for DisruptionKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TECHNICAL" => DisruptionKind::Technical,
            "WEATHER" => DisruptionKind::Weather,
            "ATC" => DisruptionKind::Atc,
            "CREW" => DisruptionKind::Crew,
            _ => DisruptionKind::Other(raw),
        }
    }
}

impl From<DisruptionKind> for String {
    fn from(kind: DisruptionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DisruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `POST /simulate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(rename = "type")]
    pub kind: DisruptionKind,

    #[serde(rename = "subType", default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

impl SimulationRequest {
    pub fn new(kind: DisruptionKind) -> Self {
        Self {
            kind,
            sub_type: None,
            flight_id: None,
            airport: None,
            severity: None,
        }
    }
}

// ============================================================================
// Crew
// ============================================================================

/// `POST /crew/update_rest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestGrantRequest {
    pub pilot_id: String,
}

/// `POST /crew/calculate_cost`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeQuoteRequest {
    pub pilot_id: String,
    pub additional_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub amount: f64,
}

/// Regulatory checks; values are strings or numbers depending on revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ComplianceSummary {
    #[serde(default)]
    pub rest_48h: Option<Value>,

    #[serde(default)]
    pub night_flights: Option<Value>,

    #[serde(default)]
    pub recent_duty: Option<Value>,
}

/// Overtime cost quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OvertimeQuote {
    #[serde(default)]
    pub cost: f64,

    #[serde(default)]
    pub breakdown: Vec<CostLine>,

    #[serde(default)]
    pub projected_fatigue: f64,

    #[serde(default)]
    pub is_overtime: bool,

    #[serde(default)]
    pub compliance: Option<ComplianceSummary>,
}
