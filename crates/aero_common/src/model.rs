//! Data model shared by the poller, the store and the resolution flow.
//!
//! The backend has renamed most fields at least once, so records accept
//! every spelling that has shipped and serialize the current one.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fatigue above this (normalised) score marks a pilot as high-risk
pub const FATIGUE_RISK_THRESHOLD: f64 = 0.8;

/// Weekly flight minutes above which a pilot is on overtime (40h)
pub const WEEKLY_DUTY_LIMIT_MINUTES: f64 = 2400.0;

// ============================================================================
// Aggregate status
// ============================================================================

/// Aggregate health signal returned by `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SystemStatus {
    #[default]
    Valid,
    Critical,
    Infeasible,
    Healing,
    Unknown,
    Other(String),
}

impl SystemStatus {
    /// Only VALID is nominal; everything else is a crisis
    pub fn is_nominal(&self) -> bool {
        matches!(self, SystemStatus::Valid)
    }

    pub fn as_str(&self) -> &str {
        match self {
            SystemStatus::Valid => "VALID",
            SystemStatus::Critical => "CRITICAL",
            SystemStatus::Infeasible => "INFEASIBLE",
            SystemStatus::Healing => "HEALING",
            SystemStatus::Unknown => "UNKNOWN",
            SystemStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for SystemStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "VALID" => SystemStatus::Valid,
            "CRITICAL" => SystemStatus::Critical,
            "INFEASIBLE" => SystemStatus::Infeasible,
            "HEALING" => SystemStatus::Healing,
            "UNKNOWN" => SystemStatus::Unknown,
            _ => SystemStatus::Other(raw),
        }
    }
}

impl From<SystemStatus> for String {
    fn from(status: SystemStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Operating mode
// ============================================================================

/// Whether the orchestrator resolves on its own or waits for the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrchestratorMode {
    #[default]
    Auto,
    Manual,
}

impl OrchestratorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestratorMode::Auto => "AUTO",
            OrchestratorMode::Manual => "MANUAL",
        }
    }
}

impl FromStr for OrchestratorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(OrchestratorMode::Auto),
            "manual" => Ok(OrchestratorMode::Manual),
            other => Err(format!("unknown mode '{}' (expected auto or manual)", other)),
        }
    }
}

impl fmt::Display for OrchestratorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Flights
// ============================================================================

/// Operational status of a single flight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum FlightStatus {
    #[default]
    Scheduled,
    Delayed,
    Cancelled,
    Unassigned,
    RiskHigh,
    Other(String),
}

impl FlightStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FlightStatus::Scheduled => "SCHEDULED",
            FlightStatus::Delayed => "DELAYED",
            FlightStatus::Cancelled => "CANCELLED",
            FlightStatus::Unassigned => "UNASSIGNED",
            FlightStatus::RiskHigh => "RISK_HIGH",
            FlightStatus::Other(raw) => raw,
        }
    }

    /// Statuses the backend counts towards a crisis
    pub fn is_disrupted(&self) -> bool {
        matches!(
            self,
            FlightStatus::Delayed | FlightStatus::Unassigned | FlightStatus::RiskHigh
        )
    }
}

impl From<String> for FlightStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => FlightStatus::Scheduled,
            "DELAYED" => FlightStatus::Delayed,
            "CANCELLED" => FlightStatus::Cancelled,
            "UNASSIGNED" => FlightStatus::Unassigned,
            "RISK_HIGH" => FlightStatus::RiskHigh,
            _ => FlightStatus::Other(raw),
        }
    }
}

impl From<FlightStatus> for String {
    fn from(status: FlightStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled or disrupted flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FlightRecord {
    #[serde(default, rename = "_id", alias = "id")]
    pub id: String,

    #[serde(default, rename = "flightNumber", alias = "Flight_ID", alias = "flight_number")]
    pub flight_number: String,

    #[serde(default, alias = "Origin")]
    pub origin: String,

    #[serde(default, alias = "Destination")]
    pub destination: String,

    /// Departure as sent by the backend (ISO 8601 or "YYYY-MM-DD HH:MM")
    #[serde(default, alias = "Departure_Time", alias = "departure_time")]
    pub departure: Option<String>,

    #[serde(default, rename = "assignedPilotId", alias = "Pilot_ID", alias = "assigned_pilot")]
    pub assigned_pilot: Option<String>,

    #[serde(default, rename = "Pilot_Name", alias = "Name")]
    pub pilot_name: Option<String>,

    #[serde(default, alias = "Sys_Status")]
    pub status: FlightStatus,

    #[serde(default, rename = "delayMinutes", alias = "Delay_Minutes", alias = "delay_minutes")]
    pub delay_minutes: Option<u32>,

    #[serde(default, rename = "disruptionType", alias = "Disruption_Type", alias = "disruption_type")]
    pub disruption_type: Option<String>,
}

impl FlightRecord {
    /// Identifier the backend uses in option payloads
    pub fn reference(&self) -> &str {
        if self.flight_number.is_empty() {
            &self.id
        } else {
            &self.flight_number
        }
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_pilot.as_deref().map_or(true, str::is_empty)
    }

    /// UNASSIGNED status must coincide with a missing pilot reference
    pub fn is_consistent(&self) -> bool {
        (self.status == FlightStatus::Unassigned) == self.is_unassigned()
    }

    /// Delay minutes only carry meaning for DELAYED flights
    pub fn effective_delay(&self) -> Option<u32> {
        if self.status == FlightStatus::Delayed {
            self.delay_minutes
        } else {
            None
        }
    }

    pub fn departure_at(&self) -> Option<NaiveDateTime> {
        let raw = self.departure.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn route(&self) -> String {
        format!("{} -> {}", self.origin, self.destination)
    }
}

// ============================================================================
// Pilots
// ============================================================================

/// One crew member with readiness and duty data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PilotRecord {
    #[serde(default, rename = "_id", alias = "id")]
    pub id: String,

    #[serde(default, rename = "Pilot_ID")]
    pub pilot_id: Option<String>,

    #[serde(default, alias = "Pilot_Name")]
    pub name: Option<String>,

    #[serde(default)]
    pub base: Option<String>,

    #[serde(default, rename = "Rank", alias = "rank")]
    pub rank: Option<String>,

    /// Raw score; either [0,1] or a 0-100 percentage depending on revision
    #[serde(default, alias = "Fatigue_Risk_Score")]
    pub fatigue_score: Option<f64>,

    #[serde(default, rename = "currentDutyMinutes")]
    pub duty_minutes_today: Option<f64>,

    #[serde(default)]
    pub weekly_flight_minutes: Option<f64>,

    #[serde(default)]
    pub overtime_rate_per_hour: Option<f64>,

    #[serde(default, rename = "Pilot_Status")]
    pub availability: Option<String>,
}

impl PilotRecord {
    pub fn identifier(&self) -> &str {
        self.pilot_id.as_deref().unwrap_or(&self.id)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.identifier())
    }

    /// Fatigue normalised to [0,1]
    pub fn fatigue(&self) -> f64 {
        let raw = self.fatigue_score.unwrap_or(0.0);
        let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
        scaled.clamp(0.0, 1.0)
    }

    pub fn is_high_risk(&self) -> bool {
        self.fatigue() > FATIGUE_RISK_THRESHOLD
    }

    pub fn is_overtime(&self) -> bool {
        self.weekly_flight_minutes.unwrap_or(0.0) > WEEKLY_DUTY_LIMIT_MINUTES
    }

    pub fn remaining_weekly_minutes(&self) -> f64 {
        (WEEKLY_DUTY_LIMIT_MINUTES - self.weekly_flight_minutes.unwrap_or(0.0)).max(0.0)
    }
}

// ============================================================================
// Logs
// ============================================================================

/// One operational log line, indexed by arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub index: usize,
    pub message: String,
}

// ============================================================================
// Resolution options
// ============================================================================

/// Kind of remediation an option performs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Assign,
    SwapFlight,
    DelayManual,
    DelayApply,
    Reschedule,
    Cancel,
    Other(String),
}

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Assign => "ASSIGN",
            ActionType::SwapFlight => "SWAP_FLIGHT",
            ActionType::DelayManual => "DELAY_MANUAL",
            ActionType::DelayApply => "DELAY_APPLY",
            ActionType::Reschedule => "RESCHEDULE",
            ActionType::Cancel => "CANCEL",
            ActionType::Other(raw) => raw,
        }
    }

    /// DELAY_MANUAL must go through the delay sub-flow first
    pub fn is_directly_resolvable(&self) -> bool {
        !matches!(self, ActionType::DelayManual)
    }
}

impl From<String> for ActionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "ASSIGN" => ActionType::Assign,
            "SWAP_FLIGHT" => ActionType::SwapFlight,
            "DELAY_MANUAL" => ActionType::DelayManual,
            "DELAY_APPLY" => ActionType::DelayApply,
            "RESCHEDULE" => ActionType::Reschedule,
            "CANCEL" => ActionType::Cancel,
            _ => ActionType::Other(raw),
        }
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Option identifiers are integers in some revisions and strings in others
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionId {
    Int(i64),
    Text(String),
}

impl OptionId {
    /// Match operator input against this id ("1" matches both 1 and "1")
    pub fn matches(&self, input: &str) -> bool {
        let input = input.trim();
        match self {
            OptionId::Int(n) => input.parse::<i64>().map_or(false, |v| v == *n),
            OptionId::Text(s) => s.eq_ignore_ascii_case(input),
        }
    }
}

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionId::Int(n) => write!(f, "{}", n),
            OptionId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for OptionId {
    fn from(s: &str) -> Self {
        OptionId::Text(s.to_string())
    }
}

impl From<i64> for OptionId {
    fn from(n: i64) -> Self {
        OptionId::Int(n)
    }
}

/// Keep an explicit `null` apart from an absent key: `None` is absent,
/// `Some(None)` is null.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One candidate remediation strategy.
///
/// Round-trips losslessly: absent keys stay absent, explicit nulls stay null
/// and unknown top-level fields are kept in `extra`, so the exact object
/// received can be sent back to `/resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOption {
    pub id: OptionId,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    title: Option<Option<String>>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    description: Option<Option<String>>,

    pub action_type: ActionType,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    payload: Option<Option<Map<String, Value>>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolutionOption {
    pub fn new(id: impl Into<OptionId>, action_type: ActionType) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            action_type,
            payload: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(Some(title.into()));
        self
    }

    pub fn with_payload(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload_mut().insert(key.to_string(), value.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_ref().and_then(Option::as_deref)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_ref().and_then(Option::as_deref)
    }

    /// `None` when the payload is absent or null
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref().and_then(Option::as_ref)
    }

    /// Payload map, created empty when absent or null
    pub fn payload_mut(&mut self) -> &mut Map<String, Value> {
        self.payload.get_or_insert(None).get_or_insert_with(Map::new)
    }

    pub fn is_directly_resolvable(&self) -> bool {
        self.action_type.is_directly_resolvable()
    }

    /// Flight this option acts on, if the payload names one
    pub fn target_flight(&self) -> Option<&str> {
        let payload = self.payload()?;
        ["flight_id", "target_flight_id"]
            .iter()
            .find_map(|key| payload.get(*key).and_then(Value::as_str))
    }

    pub fn label(&self) -> String {
        match self.title() {
            Some(title) => title.to_string(),
            None => format!("{} #{}", self.action_type, self.id),
        }
    }
}

// ============================================================================
// Recommendation
// ============================================================================

/// Free-form sustainability metrics (fuel, CO2, ...) attached to a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SustainabilityImpact {
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Value>,
}

impl SustainabilityImpact {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Backend-selected best strategy with its justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPacket {
    pub recommended_strategy: ResolutionOption,

    #[serde(default)]
    pub reasoning_trace: Vec<String>,

    #[serde(default)]
    pub sustainability_impact: Option<SustainabilityImpact>,
}
