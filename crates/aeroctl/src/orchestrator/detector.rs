//! Crisis Detector
//!
//! Turns the level-based aggregate status into edge-triggered heal requests.
//! While in crisis the edge is Armed (may trigger), Pending (heal in flight)
//! or Consumed (a heal settled; further crisis polls stay quiet until the
//! edge is re-armed or the status recovers).

use aero_common::{HealTriggerPolicy, OrchestratorMode, SystemStatus};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrisisPhase {
    Nominal,
    Crisis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Armed,
    Pending,
    Consumed,
}

/// What the runtime should do after an observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorSignal {
    Quiet,
    TriggerHeal,
    /// Status returned to nominal; pending resolution state must be cleared
    Recovered,
}

#[derive(Debug)]
pub struct CrisisDetector {
    policy: HealTriggerPolicy,
    phase: CrisisPhase,
    edge: EdgeState,
    /// Observations with a lower sequence cannot trigger
    armed_from: u64,
    last_status: Option<SystemStatus>,
}

impl CrisisDetector {
    pub fn new(policy: HealTriggerPolicy) -> Self {
        Self {
            policy,
            phase: CrisisPhase::Nominal,
            edge: EdgeState::Armed,
            armed_from: 0,
            last_status: None,
        }
    }

    pub fn phase(&self) -> CrisisPhase {
        self.phase
    }

    pub fn edge(&self) -> EdgeState {
        self.edge
    }

    pub fn last_status(&self) -> Option<&SystemStatus> {
        self.last_status.as_ref()
    }

    fn permits(&self, mode: OrchestratorMode) -> bool {
        match self.policy {
            HealTriggerPolicy::Always => true,
            HealTriggerPolicy::AutoOnly => mode == OrchestratorMode::Auto,
        }
    }

    /// Feed one status observation taken by poll `sequence`
    pub fn observe(
        &mut self,
        status: &SystemStatus,
        mode: OrchestratorMode,
        sequence: u64,
    ) -> DetectorSignal {
        self.last_status = Some(status.clone());

        if status.is_nominal() {
            if self.phase == CrisisPhase::Crisis {
                debug!("crisis cleared");
                self.phase = CrisisPhase::Nominal;
                self.edge = EdgeState::Armed;
                return DetectorSignal::Recovered;
            }
            return DetectorSignal::Quiet;
        }

        if self.phase == CrisisPhase::Nominal {
            debug!(%status, sequence, "nominal -> crisis edge");
            self.phase = CrisisPhase::Crisis;
            self.edge = EdgeState::Armed;
        }

        if self.edge == EdgeState::Armed && sequence >= self.armed_from && self.permits(mode) {
            self.edge = EdgeState::Pending;
            return DetectorSignal::TriggerHeal;
        }
        DetectorSignal::Quiet
    }

    /// Mode switch; under `auto_only` an armed crisis edge fires on entering AUTO
    pub fn mode_changed(&mut self, mode: OrchestratorMode) -> DetectorSignal {
        if self.policy == HealTriggerPolicy::AutoOnly
            && mode == OrchestratorMode::Auto
            && self.phase == CrisisPhase::Crisis
            && self.edge == EdgeState::Armed
        {
            self.edge = EdgeState::Pending;
            return DetectorSignal::TriggerHeal;
        }
        DetectorSignal::Quiet
    }

    /// Operator-initiated heal consumes the edge like an automatic one
    pub fn manual_heal(&mut self) {
        self.edge = EdgeState::Pending;
    }

    pub fn heal_settled(&mut self) {
        if self.edge == EdgeState::Pending {
            self.edge = EdgeState::Consumed;
        }
    }

    /// A failed heal leaves the edge armed for the next observation
    pub fn heal_failed(&mut self) {
        if self.edge == EdgeState::Pending {
            self.edge = EdgeState::Armed;
        }
    }

    /// Re-arm after the crisis was acted on; polls issued before
    /// `from_sequence` are too old to re-trigger
    pub fn rearm(&mut self, from_sequence: u64) {
        self.edge = EdgeState::Armed;
        self.armed_from = from_sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrchestratorMode::*;
    use SystemStatus::*;

    #[test]
    fn test_single_trigger_per_edge() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        assert_eq!(detector.observe(&Valid, Auto, 0), DetectorSignal::Quiet);
        assert_eq!(detector.observe(&Valid, Auto, 1), DetectorSignal::Quiet);
        assert_eq!(detector.observe(&Critical, Auto, 2), DetectorSignal::TriggerHeal);
        detector.heal_settled();
        assert_eq!(detector.observe(&Critical, Auto, 3), DetectorSignal::Quiet);
        assert_eq!(detector.observe(&Infeasible, Auto, 4), DetectorSignal::Quiet);
    }

    #[test]
    fn test_first_observation_crisis_is_edge() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        assert_eq!(detector.observe(&Unknown, Manual, 0), DetectorSignal::TriggerHeal);
    }

    #[test]
    fn test_failed_heal_retries_on_next_observation() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        assert_eq!(detector.observe(&Critical, Auto, 0), DetectorSignal::TriggerHeal);
        detector.heal_failed();
        assert_eq!(detector.observe(&Critical, Auto, 1), DetectorSignal::TriggerHeal);
        detector.heal_settled();
        assert_eq!(detector.observe(&Critical, Auto, 2), DetectorSignal::Quiet);
    }

    #[test]
    fn test_recovery_then_new_edge() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        detector.observe(&Critical, Auto, 0);
        detector.heal_settled();
        assert_eq!(detector.observe(&Valid, Auto, 1), DetectorSignal::Recovered);
        assert_eq!(detector.phase(), CrisisPhase::Nominal);
        assert_eq!(detector.observe(&Critical, Auto, 2), DetectorSignal::TriggerHeal);
    }

    #[test]
    fn test_rearm_ignores_stale_sequence() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        detector.observe(&Critical, Auto, 0);
        detector.heal_settled();
        detector.rearm(5);
        assert_eq!(detector.observe(&Critical, Auto, 4), DetectorSignal::Quiet);
        assert_eq!(detector.observe(&Critical, Auto, 5), DetectorSignal::TriggerHeal);
    }

    #[test]
    fn test_auto_only_holds_manual_crisis() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::AutoOnly);
        assert_eq!(detector.observe(&Critical, Manual, 0), DetectorSignal::Quiet);
        assert_eq!(detector.observe(&Critical, Manual, 1), DetectorSignal::Quiet);
        assert_eq!(detector.edge(), EdgeState::Armed);
        assert_eq!(detector.mode_changed(Auto), DetectorSignal::TriggerHeal);
        assert_eq!(detector.edge(), EdgeState::Pending);
    }

    #[test]
    fn test_mode_change_quiet_under_always() {
        let mut detector = CrisisDetector::new(HealTriggerPolicy::Always);
        detector.observe(&Critical, Manual, 0);
        detector.heal_failed();
        assert_eq!(detector.mode_changed(Auto), DetectorSignal::Quiet);
    }
}
