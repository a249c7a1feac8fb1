//! Commands accepted by the orchestrator and notices it publishes

use super::flow::FlowPhase;
use super::healing::HealOutcome;
use aero_common::{
    AeroError, Ack, OrchestratorMode, OvertimeQuote, ResolutionOption, SimulationRequest,
    SystemStatus,
};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Pick a pending option by id
    Select(String),
    /// Resolve with the recommended strategy
    Approve,
    /// Leave the recommendation view for the full list
    ViewAll,
    /// Delay the recommendation's target flight manually
    Override,
    /// Raw operator input for the delay draft
    SetMinutes(String),
    ConfirmDelay,
    CancelDelay,
    SetMode(OrchestratorMode),
    SetPage(u32),
    /// Operator-initiated heal
    Heal,
    /// Runs off the orchestrator task
    Gateway(GatewayCall),
    /// Back to page 1 with a fresh poll cycle
    ResetView,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Simulate(SimulationRequest),
    Seed,
    GrantRest(String),
    QuoteOvertime { pilot_id: String, minutes: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Flow(FlowPhase),
    Resolved {
        option: ResolutionOption,
        ack: Ack,
    },
    Minutes(u32),
    Heal(HealOutcome),
    Ack(Ack),
    Quote(OvertimeQuote),
    Mode(OrchestratorMode),
    Page(u32),
    Stopped,
}

pub type ReplySender = oneshot::Sender<Result<Reply, AeroError>>;

/// Queued command with an optional reply channel
#[derive(Debug)]
pub struct Envelope {
    pub command: Command,
    pub reply: Option<ReplySender>,
}

/// Published for the console; nothing depends on them being received
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    SnapshotUpdated { sequence: u64 },
    CrisisDetected(SystemStatus),
    HealHeld(SystemStatus),
    Recovered,
    HealFailed(String),
    HealApplied { status: String, message: Option<String> },
    OptionsPresented { count: usize, recommended: bool },
    Resolved { option: ResolutionOption, automatic: bool },
    ResolveFailed(String),
    AwaitingOperator,
}
