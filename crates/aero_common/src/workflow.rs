//! Agent pipeline stages derived from operational log keywords.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageState {
    Pending,
    Active,
    Completed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StageState::Pending => "pending",
            StageState::Active => "active",
            StageState::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub label: &'static str,
    pub state: StageState,
}

pub const STAGE_LABELS: [&str; 5] = [
    "Monitor Traffic",
    "Anomaly Detection",
    "Constraint Solver",
    "Negotiation Agent",
    "Execution",
];

const ANOMALY_KEYWORDS: &[&str] = &[
    "SICK", "FATIGUE", "DELAYED", "TECHNICAL", "ATC", "WEATHER", "CREW",
];
const ANALYSIS_KEYWORDS: &[&str] = &["risk", "Analysis"];
const NEGOTIATION_KEYWORDS: &[&str] = &["Options", "OPTIONS_GENERATED", "Negotiation"];
const EXECUTION_KEYWORDS: &[&str] = &["Applied", "HEALED"];

/// Derive the five pipeline stages from the full log history.
///
/// Keywords are case-sensitive and matched anywhere in any line. Each rule
/// completes the stage before it and activates (or, for execution, completes)
/// its own stage. Rules are applied in pipeline order.
pub fn workflow_stages<S: AsRef<str>>(logs: &[S]) -> Vec<WorkflowStage> {
    let mut states = [
        StageState::Active,
        StageState::Pending,
        StageState::Pending,
        StageState::Pending,
        StageState::Pending,
    ];
    let mentions = |keywords: &[&str]| {
        logs.iter()
            .any(|line| keywords.iter().any(|k| line.as_ref().contains(k)))
    };

    if mentions(&["found"][..]) {
        states[0] = StageState::Completed;
    }
    if mentions(ANOMALY_KEYWORDS) {
        states[0] = StageState::Completed;
        states[1] = StageState::Active;
    }
    if mentions(ANALYSIS_KEYWORDS) {
        states[1] = StageState::Completed;
        states[2] = StageState::Active;
    }
    if mentions(NEGOTIATION_KEYWORDS) {
        states[2] = StageState::Completed;
        states[3] = StageState::Active;
    }
    if mentions(EXECUTION_KEYWORDS) {
        states[3] = StageState::Completed;
        states[4] = StageState::Completed;
    }

    STAGE_LABELS
        .iter()
        .zip(states)
        .map(|(label, state)| WorkflowStage {
            label: *label,
            state,
        })
        .collect()
}
