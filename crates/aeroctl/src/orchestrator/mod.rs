//! Disruption resolution orchestrator
//!
//! Poller -> store -> detector -> (edge) healing client -> flow controller
//! -> resolve -> next poll.

pub mod detector;
pub mod events;
pub mod flow;
pub mod gateway;
pub mod healing;
pub mod poller;
pub mod runtime;
pub mod store;

pub use detector::{CrisisDetector, CrisisPhase, DetectorSignal, EdgeState};
pub use events::{Command, GatewayCall, Notice, Reply};
pub use flow::{
    derive_delay_apply, Decision, DecisionView, DelayDraft, FlowController, FlowPhase, FlowStep,
    ResolutionFlow, MANUAL_OVERRIDE_ID,
};
pub use gateway::SimulationGateway;
pub use healing::{HealOutcome, HealingClient};
pub use poller::{fetch_report, PollReport, TelemetryPoller};
pub use runtime::{Orchestrator, OrchestratorHandle};
pub use store::{SharedStore, StateStore};
