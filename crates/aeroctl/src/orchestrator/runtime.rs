//! Orchestrator runtime
//!
//! One task owns the detector, the poller lifecycle and all store writes.
//! Poll reports and operator commands are handled one at a time, so no two
//! reactions ever overlap. Gateway calls are the exception: they run in
//! spawned tasks and report back through their reply channel.

use super::detector::{CrisisDetector, CrisisPhase, DetectorSignal};
use super::events::{Command, Envelope, GatewayCall, Notice, Reply, ReplySender};
use super::flow::FlowStep;
use super::gateway::SimulationGateway;
use super::healing::{HealOutcome, HealingClient};
use super::poller::{fetch_report, PollReport, TelemetryPoller};
use super::store::{SharedStore, StateStore};
use crate::backend::{check_ack, DisruptionBackend};
use crate::logging::{DecisionEntry, DecisionLog};
use aero_common::{
    endpoints, AeroConfig, AeroError, Ack, OrchestratorMode, ResolutionOption, SnapshotPolicy,
    SystemStatus,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

const REPORT_QUEUE: usize = 16;
const COMMAND_QUEUE: usize = 32;
const NOTICE_QUEUE: usize = 64;

fn stopped() -> AeroError {
    AeroError::InvalidTransition {
        action: "send a command",
        phase: "stopped".to_string(),
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable front door to a running orchestrator
#[derive(Clone)]
pub struct OrchestratorHandle {
    commands: mpsc::Sender<Envelope>,
    store: SharedStore,
    notices: broadcast::Sender<Notice>,
}

impl OrchestratorHandle {
    pub async fn execute(&self, command: Command) -> Result<Reply, AeroError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Envelope {
                command,
                reply: Some(tx),
            })
            .await
            .map_err(|_| stopped())?;
        rx.await.map_err(|_| stopped())?
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct Orchestrator {
    config: AeroConfig,
    backend: Arc<dyn DisruptionBackend>,
    store: SharedStore,
    detector: CrisisDetector,
    healer: HealingClient,
    gateway: Arc<SimulationGateway>,
    poller: TelemetryPoller,
    reports: mpsc::Receiver<PollReport>,
    commands: mpsc::Receiver<Envelope>,
    command_tx: mpsc::Sender<Envelope>,
    notices: broadcast::Sender<Notice>,
    audit: DecisionLog,
}

impl Orchestrator {
    pub fn new(
        config: AeroConfig,
        mode: OrchestratorMode,
        backend: Arc<dyn DisruptionBackend>,
        audit: DecisionLog,
    ) -> Self {
        let (report_tx, reports) = mpsc::channel(REPORT_QUEUE);
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE);
        let (notices, _) = broadcast::channel(NOTICE_QUEUE);

        let store = StateStore::new(mode, 1, &config.orchestrator).shared();
        let poller = TelemetryPoller::new(Arc::clone(&backend), &config.polling, report_tx);

        Self {
            detector: CrisisDetector::new(config.orchestrator.heal_trigger),
            healer: HealingClient::new(Arc::clone(&backend)),
            gateway: Arc::new(SimulationGateway::new(Arc::clone(&backend))),
            config,
            backend,
            store,
            poller,
            reports,
            commands,
            command_tx,
            notices,
            audit,
        }
    }

    pub fn handle(&self) -> OrchestratorHandle {
        OrchestratorHandle {
            commands: self.command_tx.clone(),
            store: Arc::clone(&self.store),
            notices: self.notices.clone(),
        }
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn detector(&self) -> &CrisisDetector {
        &self.detector
    }

    pub fn poller(&self) -> &TelemetryPoller {
        &self.poller
    }

    pub fn gateway(&self) -> &SimulationGateway {
        &self.gateway
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }

    /// Poll `page` on the interval and serve commands until `Shutdown`
    pub async fn run(mut self, page: u32) {
        self.store.write().await.set_page(page);
        self.poller.start(page.max(1));
        info!(backend = %self.backend.describe(), page, "orchestrator running");

        loop {
            tokio::select! {
                Some(envelope) = self.commands.recv() => {
                    if !self.dispatch(envelope).await {
                        break;
                    }
                }
                Some(report) = self.reports.recv() => self.handle_report(report).await,
                else => break,
            }
        }

        self.poller.stop();
        info!("orchestrator stopped");
    }

    /// Returns false once the loop should stop
    async fn dispatch(&mut self, envelope: Envelope) -> bool {
        let Envelope { command, reply } = envelope;

        if let Command::Gateway(call) = command {
            self.spawn_gateway(call, reply);
            return true;
        }

        let stop = command == Command::Shutdown;
        let result = self.handle_command(command).await;
        match reply {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => {
                if let Err(e) = result {
                    warn!(error = %e, "queued command failed");
                }
            }
        }
        !stop
    }

    /// Run one command to completion, gateway calls included
    pub async fn execute(&mut self, command: Command) -> Result<Reply, AeroError> {
        self.handle_command(command).await
    }

    /// Handle commands queued without a caller waiting (e.g. after a reseed)
    pub async fn process_pending(&mut self) {
        while let Ok(envelope) = self.commands.try_recv() {
            self.dispatch(envelope).await;
        }
    }

    /// Fetch and apply one tick outside the timer
    pub async fn poll_now(&mut self) {
        let page = self.store.read().await.page();
        let report = fetch_report(
            self.backend.as_ref(),
            page,
            self.poller.page_size(),
            self.poller.generation(),
            self.poller.claim_sequence(),
        )
        .await;
        self.handle_report(report).await;
    }

    // ========================================================================
    // Poll reports
    // ========================================================================

    pub async fn handle_report(&mut self, report: PollReport) {
        if report.generation != self.poller.generation() {
            debug!(
                generation = report.generation,
                current = self.poller.generation(),
                sequence = report.sequence,
                "discarding stale poll report"
            );
            return;
        }
        if self.config.polling.snapshot_policy == SnapshotPolicy::AllOrNothing
            && !report.is_complete()
        {
            debug!(sequence = report.sequence, "incomplete tick ignored");
            return;
        }

        let observed = report.status.as_ref().map(|s| s.status.clone());
        {
            let mut store = self.store.write().await;
            if let Some(data) = report.data {
                store.apply_data(data);
            }
            if let Some(status) = report.status {
                store.apply_status(status);
            }
        }
        self.notify(Notice::SnapshotUpdated {
            sequence: report.sequence,
        });

        if let Some(status) = observed {
            self.observe(status, report.sequence).await;
        }
    }

    async fn observe(&mut self, status: SystemStatus, sequence: u64) {
        let mode = self.store.read().await.mode();
        let was_nominal = self.detector.phase() == CrisisPhase::Nominal;
        let signal = self.detector.observe(&status, mode, sequence);

        if was_nominal && self.detector.phase() == CrisisPhase::Crisis {
            info!(%status, %mode, "crisis detected");
            self.notify(Notice::CrisisDetected(status.clone()));
            if signal == DetectorSignal::Quiet {
                info!("heal held until AUTO mode or an explicit heal");
                self.notify(Notice::HealHeld(status));
            }
        }

        match signal {
            DetectorSignal::TriggerHeal => {
                if let Err(e) = self.run_heal(mode).await {
                    debug!(error = %e, "heal will be retried on the next crisis poll");
                }
            }
            DetectorSignal::Recovered => {
                self.store.write().await.flow.clear();
                info!("status nominal, pending resolution cleared");
                self.notify(Notice::Recovered);
            }
            DetectorSignal::Quiet => {}
        }
    }

    // ========================================================================
    // Healing and resolution
    // ========================================================================

    async fn run_heal(&mut self, mode: OrchestratorMode) -> Result<HealOutcome, AeroError> {
        let outcome = match self.healer.request(mode).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.detector.heal_failed();
                warn!(%mode, error = %e, "heal request failed");
                self.audit
                    .record(&DecisionEntry::new("heal", mode).failed(&e));
                self.notify(Notice::HealFailed(e.to_string()));
                return Err(e);
            }
        };

        self.detector.heal_settled();
        {
            let mut store = self.store.write().await;
            outcome.apply(
                &mut store.flow,
                mode,
                self.config.orchestrator.preserve_options_in_manual,
            );
            if let HealOutcome::OptionsGenerated { agent_nodes, .. } = &outcome {
                store.set_agent_nodes(agent_nodes.clone());
            }
        }
        if outcome.rearms() {
            self.detector.rearm(self.poller.next_sequence());
        }
        self.audit
            .record(&DecisionEntry::new("heal", mode).outcome(outcome.label()));

        match &outcome {
            HealOutcome::Applied { status, message } => {
                self.notify(Notice::HealApplied {
                    status: status.clone(),
                    message: message.clone(),
                });
            }
            HealOutcome::OptionsGenerated {
                options,
                recommendation,
                ..
            } => {
                self.notify(Notice::OptionsPresented {
                    count: options.len(),
                    recommended: recommendation.is_some(),
                });
                if mode == OrchestratorMode::Auto {
                    self.auto_resolve().await;
                }
            }
        }
        Ok(outcome)
    }

    async fn auto_resolve(&mut self) {
        let candidate = self.store.read().await.flow.auto_candidate();
        match candidate {
            Some(option) => {
                if let Err(e) = self.submit(option, true).await {
                    warn!(error = %e, "auto-resolve failed, options stay pending");
                }
            }
            None => {
                info!("no directly resolvable option, waiting for operator");
                self.notify(Notice::AwaitingOperator);
            }
        }
    }

    /// Send an option to `/resolve`; the flow is committed only on success
    async fn submit(&mut self, option: ResolutionOption, automatic: bool) -> Result<Ack, AeroError> {
        let mode = self.store.read().await.mode();
        let event = if automatic { "auto_resolve" } else { "resolve" };

        if !option.is_directly_resolvable() {
            return Err(AeroError::InvalidTransition {
                action: "submit a DELAY_MANUAL option",
                phase: "any phase".to_string(),
            });
        }

        let result = self
            .backend
            .resolve(&option)
            .await
            .and_then(|ack| check_ack(endpoints::RESOLVE, ack));

        match result {
            Ok(ack) => {
                self.store.write().await.flow.resolved();
                self.detector.rearm(self.poller.next_sequence());
                info!(
                    option = %option.id,
                    action = %option.action_type,
                    automatic,
                    "option resolved"
                );
                self.audit.record(
                    &DecisionEntry::new(event, mode)
                        .option(&option)
                        .outcome(ack.summary()),
                );
                self.notify(Notice::Resolved { option, automatic });
                Ok(ack)
            }
            Err(e) => {
                warn!(option = %option.id, error = %e, "resolve failed");
                self.audit
                    .record(&DecisionEntry::new(event, mode).option(&option).failed(&e));
                self.notify(Notice::ResolveFailed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn follow(&mut self, step: FlowStep) -> Result<Reply, AeroError> {
        match step {
            FlowStep::Moved(phase) => Ok(Reply::Flow(phase)),
            FlowStep::Submit(option) => {
                let ack = self.submit(option.clone(), false).await?;
                Ok(Reply::Resolved { option, ack })
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn handle_command(&mut self, command: Command) -> Result<Reply, AeroError> {
        match command {
            Command::Select(id) => {
                let step = self.store.write().await.flow.select_option(&id)?;
                self.follow(step).await
            }
            Command::Approve => {
                let step = self.store.write().await.flow.approve_recommendation()?;
                self.follow(step).await
            }
            Command::ViewAll => {
                let step = self.store.write().await.flow.view_all_options()?;
                self.follow(step).await
            }
            Command::Override => {
                let step = self.store.write().await.flow.manual_override()?;
                self.follow(step).await
            }
            Command::SetMinutes(input) => {
                let minutes = self.store.write().await.flow.set_delay_minutes(&input)?;
                Ok(Reply::Minutes(minutes))
            }
            Command::ConfirmDelay => {
                let step = self.store.read().await.flow.confirm_delay()?;
                self.follow(step).await
            }
            Command::CancelDelay => {
                let step = self.store.write().await.flow.cancel_delay()?;
                self.follow(step).await
            }
            Command::SetMode(mode) => {
                self.store.write().await.set_mode(mode);
                info!(%mode, "mode changed");
                if self.detector.mode_changed(mode) == DetectorSignal::TriggerHeal {
                    if let Err(e) = self.run_heal(mode).await {
                        debug!(error = %e, "heal on mode change failed");
                    }
                }
                Ok(Reply::Mode(mode))
            }
            Command::SetPage(page) => {
                if page == 0 {
                    return Err(AeroError::InvalidInput("pages start at 1".into()));
                }
                self.store.write().await.set_page(page);
                self.poller.restart_if_running(page);
                Ok(Reply::Page(page))
            }
            Command::Heal => {
                let mode = self.store.read().await.mode();
                self.detector.manual_heal();
                self.run_heal(mode).await.map(Reply::Heal)
            }
            Command::ResetView => {
                self.store.write().await.set_page(1);
                self.poller.restart_if_running(1);
                info!("view reset to page 1");
                Ok(Reply::Page(1))
            }
            Command::Shutdown => {
                self.poller.stop();
                Ok(Reply::Stopped)
            }
            Command::Gateway(call) => {
                let (tx, rx) = oneshot::channel();
                self.spawn_gateway(call, Some(tx));
                rx.await.map_err(|_| stopped())?
            }
        }
    }

    fn spawn_gateway(&self, call: GatewayCall, reply: Option<ReplySender>) {
        let gateway = Arc::clone(&self.gateway);
        let commands = self.command_tx.clone();

        tokio::spawn(async move {
            let result = match call {
                GatewayCall::Simulate(request) => gateway.simulate(&request).await.map(Reply::Ack),
                GatewayCall::Seed => {
                    let result = gateway.seed().await;
                    if result.is_ok() {
                        let reset = Envelope {
                            command: Command::ResetView,
                            reply: None,
                        };
                        let _ = commands.send(reset).await;
                    }
                    result.map(Reply::Ack)
                }
                GatewayCall::GrantRest(pilot_id) => {
                    gateway.grant_rest(&pilot_id).await.map(Reply::Ack)
                }
                GatewayCall::QuoteOvertime { pilot_id, minutes } => gateway
                    .quote_overtime(&pilot_id, minutes)
                    .await
                    .map(Reply::Quote),
            };

            match reply {
                Some(tx) => {
                    let _ = tx.send(result);
                }
                None => {
                    if let Err(e) = result {
                        warn!(error = %e, "gateway call failed");
                    }
                }
            }
        });
    }
}
