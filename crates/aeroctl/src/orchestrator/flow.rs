//! Resolution Flow Controller
//!
//! Three-state machine over the pending decision:
//!
//! ```text
//! Idle --present--> AwaitingDecision --select DELAY_MANUAL--> ConfiguringDelay
//!   ^                 |     ^                                   |      |
//!   +---resolved------+     +--------------cancel---------------+      |
//!   +------------------------------resolved----------------------------+
//! ```
//!
//! Actions never submit anything themselves. An action that leads to a
//! resolve returns `FlowStep::Submit`; the caller commits with `resolved()`
//! once the backend acknowledged, so a failed resolve leaves state untouched.

use aero_common::{
    ActionType, AeroError, OptionId, OrchestratorConfig, RecommendationPacket, ResolutionOption,
};
use serde_json::Value;
use std::fmt;

pub const MANUAL_OVERRIDE_ID: &str = "MANUAL_OVERRIDE";

/// Which part of the decision is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionView {
    Recommendation,
    AllOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub options: Vec<ResolutionOption>,
    pub recommendation: Option<RecommendationPacket>,
    pub view: DecisionView,
}

impl Decision {
    fn find(&self, id: &str) -> Option<&ResolutionOption> {
        self.options
            .iter()
            .chain(self.recommendation.as_ref().map(|r| &r.recommended_strategy))
            .find(|option| option.id.matches(id))
    }
}

/// A DELAY_MANUAL option being parameterised
#[derive(Debug, Clone, PartialEq)]
pub struct DelayDraft {
    pub option: ResolutionOption,
    pub minutes: u32,
    /// View restored on cancel
    pub return_view: DecisionView,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolutionFlow {
    #[default]
    Idle,
    AwaitingDecision(Decision),
    ConfiguringDelay {
        decision: Decision,
        draft: DelayDraft,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    AwaitingDecision,
    ConfiguringDelay,
}

impl fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowPhase::Idle => "idle",
            FlowPhase::AwaitingDecision => "awaiting decision",
            FlowPhase::ConfiguringDelay => "configuring delay",
        };
        f.write_str(s)
    }
}

/// Result of an operator or policy action
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStep {
    /// Send this option to `/resolve`, then call `resolved()` on success
    Submit(ResolutionOption),
    /// State changed (or stayed) without a submission
    Moved(FlowPhase),
}

/// Turn a DELAY_MANUAL option into the DELAY_APPLY option that gets submitted
pub fn derive_delay_apply(option: &ResolutionOption, minutes: u32) -> ResolutionOption {
    let mut derived = option.clone();
    derived.action_type = ActionType::DelayApply;
    derived
        .payload_mut()
        .insert("minutes".to_string(), Value::from(minutes));
    derived
}

#[derive(Debug)]
pub struct FlowController {
    state: ResolutionFlow,
    default_minutes: u32,
    max_minutes: u32,
}

impl FlowController {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            state: ResolutionFlow::Idle,
            default_minutes: config.default_delay_minutes,
            max_minutes: config.max_delay_minutes,
        }
    }

    pub fn state(&self) -> &ResolutionFlow {
        &self.state
    }

    pub fn phase(&self) -> FlowPhase {
        match self.state {
            ResolutionFlow::Idle => FlowPhase::Idle,
            ResolutionFlow::AwaitingDecision(_) => FlowPhase::AwaitingDecision,
            ResolutionFlow::ConfiguringDelay { .. } => FlowPhase::ConfiguringDelay,
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match &self.state {
            ResolutionFlow::Idle => None,
            ResolutionFlow::AwaitingDecision(decision)
            | ResolutionFlow::ConfiguringDelay { decision, .. } => Some(decision),
        }
    }

    pub fn pending_options(&self) -> &[ResolutionOption] {
        self.decision()
            .map(|d| d.options.as_slice())
            .unwrap_or(&[])
    }

    pub fn recommendation(&self) -> Option<&RecommendationPacket> {
        self.decision().and_then(|d| d.recommendation.as_ref())
    }

    pub fn draft(&self) -> Option<&DelayDraft> {
        match &self.state {
            ResolutionFlow::ConfiguringDelay { draft, .. } => Some(draft),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> AeroError {
        AeroError::InvalidTransition {
            action,
            phase: self.phase().to_string(),
        }
    }

    fn awaiting(&self, action: &'static str) -> Result<&Decision, AeroError> {
        match &self.state {
            ResolutionFlow::AwaitingDecision(decision) => Ok(decision),
            _ => Err(self.invalid(action)),
        }
    }

    fn enter_delay(&mut self, option: ResolutionOption) -> FlowStep {
        let previous = std::mem::take(&mut self.state);
        if let ResolutionFlow::AwaitingDecision(decision) = previous {
            let draft = DelayDraft {
                option,
                minutes: self.default_minutes,
                return_view: decision.view,
            };
            self.state = ResolutionFlow::ConfiguringDelay { decision, draft };
        } else {
            self.state = previous;
        }
        FlowStep::Moved(self.phase())
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Options generated; replaces any current decision and discards a draft
    pub fn present(
        &mut self,
        options: Vec<ResolutionOption>,
        recommendation: Option<RecommendationPacket>,
    ) {
        let view = if recommendation.is_some() {
            DecisionView::Recommendation
        } else {
            DecisionView::AllOptions
        };
        self.state = ResolutionFlow::AwaitingDecision(Decision {
            options,
            recommendation,
            view,
        });
    }

    pub fn select_option(&mut self, id: &str) -> Result<FlowStep, AeroError> {
        let option = self
            .awaiting("select an option")?
            .find(id)
            .cloned()
            .ok_or_else(|| AeroError::UnknownOption(id.to_string()))?;

        if option.is_directly_resolvable() {
            Ok(FlowStep::Submit(option))
        } else {
            Ok(self.enter_delay(option))
        }
    }

    pub fn approve_recommendation(&mut self) -> Result<FlowStep, AeroError> {
        let strategy = self
            .awaiting("approve")?
            .recommendation
            .as_ref()
            .map(|r| r.recommended_strategy.clone())
            .ok_or_else(|| self.invalid("approve without a recommendation"))?;

        if strategy.is_directly_resolvable() {
            Ok(FlowStep::Submit(strategy))
        } else {
            Ok(self.enter_delay(strategy))
        }
    }

    /// Drop the recommendation view, keep the options
    pub fn view_all_options(&mut self) -> Result<FlowStep, AeroError> {
        match &mut self.state {
            ResolutionFlow::AwaitingDecision(decision) => {
                decision.view = DecisionView::AllOptions;
                Ok(FlowStep::Moved(FlowPhase::AwaitingDecision))
            }
            _ => Err(self.invalid("view all options")),
        }
    }

    /// Delay the recommendation's target flight by hand
    pub fn manual_override(&mut self) -> Result<FlowStep, AeroError> {
        let recommendation = self
            .awaiting("manual override")?
            .recommendation
            .as_ref()
            .ok_or_else(|| self.invalid("manual override without a recommendation"))?;

        let flight = recommendation
            .recommended_strategy
            .target_flight()
            .map(str::to_string)
            .ok_or_else(|| self.invalid("manual override without a target flight"))?;

        let option = ResolutionOption::new(OptionId::from(MANUAL_OVERRIDE_ID), ActionType::DelayManual)
            .with_title(format!("Manual delay for {}", flight))
            .with_payload("flight_id", flight);
        Ok(self.enter_delay(option))
    }

    /// Validate and store the minute value; the previous value survives errors
    pub fn set_delay_minutes(&mut self, input: &str) -> Result<u32, AeroError> {
        let max = self.max_minutes;
        let phase = self.phase();
        let draft = match &mut self.state {
            ResolutionFlow::ConfiguringDelay { draft, .. } => draft,
            _ => {
                return Err(AeroError::InvalidTransition {
                    action: "set delay minutes",
                    phase: phase.to_string(),
                })
            }
        };

        let minutes = input
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=max).contains(m))
            .ok_or_else(|| AeroError::InvalidDelay(input.trim().to_string()))?;
        draft.minutes = minutes;
        Ok(minutes)
    }

    pub fn confirm_delay(&self) -> Result<FlowStep, AeroError> {
        match &self.state {
            ResolutionFlow::ConfiguringDelay { draft, .. } => Ok(FlowStep::Submit(
                derive_delay_apply(&draft.option, draft.minutes),
            )),
            _ => Err(self.invalid("confirm a delay")),
        }
    }

    pub fn cancel_delay(&mut self) -> Result<FlowStep, AeroError> {
        match std::mem::take(&mut self.state) {
            ResolutionFlow::ConfiguringDelay {
                mut decision,
                draft,
            } => {
                decision.view = draft.return_view;
                self.state = ResolutionFlow::AwaitingDecision(decision);
                Ok(FlowStep::Moved(FlowPhase::AwaitingDecision))
            }
            other => {
                self.state = other;
                Err(self.invalid("cancel a delay"))
            }
        }
    }

    /// Commit a successful resolve
    pub fn resolved(&mut self) {
        self.state = ResolutionFlow::Idle;
    }

    /// Crisis cleared or an applied heal superseded the decision
    pub fn clear(&mut self) {
        self.state = ResolutionFlow::Idle;
    }

    /// Option AUTO mode resolves with: the recommendation if directly
    /// resolvable, else the first directly resolvable option
    pub fn auto_candidate(&self) -> Option<ResolutionOption> {
        let decision = match &self.state {
            ResolutionFlow::AwaitingDecision(decision) => decision,
            _ => return None,
        };
        decision
            .recommendation
            .as_ref()
            .map(|r| &r.recommended_strategy)
            .filter(|s| s.is_directly_resolvable())
            .or_else(|| decision.options.iter().find(|o| o.is_directly_resolvable()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn controller() -> FlowController {
        FlowController::new(&OrchestratorConfig::default())
    }

    fn delay_manual(id: i64, flight: &str) -> ResolutionOption {
        ResolutionOption::new(id, ActionType::DelayManual).with_payload("flight_id", flight)
    }

    fn assign(id: i64) -> ResolutionOption {
        ResolutionOption::new(id, ActionType::Assign)
            .with_title("Assign P-204")
            .with_payload("flight_id", "F1")
            .with_payload("pilot_id", "P-204")
    }

    fn packet(strategy: ResolutionOption) -> RecommendationPacket {
        RecommendationPacket {
            recommended_strategy: strategy,
            reasoning_trace: vec!["rested crew".into()],
            sustainability_impact: None,
        }
    }

    #[test]
    fn test_select_resolvable_submits_without_moving() {
        let mut flow = controller();
        flow.present(vec![assign(1)], None);
        let step = flow.select_option("1").unwrap();
        assert_eq!(step, FlowStep::Submit(assign(1)));
        assert_eq!(flow.phase(), FlowPhase::AwaitingDecision);
        flow.resolved();
        assert_eq!(flow.phase(), FlowPhase::Idle);
        assert!(flow.pending_options().is_empty());
    }

    #[test]
    fn test_delay_manual_enters_configuring() {
        let mut flow = controller();
        flow.present(vec![delay_manual(1, "F1")], None);
        let step = flow.select_option("1").unwrap();
        assert_eq!(step, FlowStep::Moved(FlowPhase::ConfiguringDelay));
        assert_eq!(flow.draft().unwrap().minutes, 60);
    }

    #[test]
    fn test_confirm_builds_delay_apply() {
        let mut flow = controller();
        flow.present(vec![delay_manual(1, "F1")], None);
        flow.select_option("1").unwrap();
        assert_eq!(flow.set_delay_minutes("90").unwrap(), 90);

        let FlowStep::Submit(option) = flow.confirm_delay().unwrap() else {
            panic!("expected submit");
        };
        assert_eq!(
            serde_json::to_value(&option).unwrap(),
            json!({"id": 1, "action_type": "DELAY_APPLY", "payload": {"flight_id": "F1", "minutes": 90}})
        );
    }

    #[test]
    fn test_invalid_minutes_keep_previous_value() {
        let mut flow = controller();
        flow.present(vec![delay_manual(1, "F1")], None);
        flow.select_option("1").unwrap();
        flow.set_delay_minutes("45").unwrap();

        for bad in ["ninety", "0", "-5", "1441", "12.5", ""] {
            let err = flow.set_delay_minutes(bad).unwrap_err();
            assert!(matches!(err, AeroError::InvalidDelay(_)), "{}", bad);
        }
        assert_eq!(flow.phase(), FlowPhase::ConfiguringDelay);
        assert_eq!(flow.draft().unwrap().minutes, 45);
    }

    #[test]
    fn test_cancel_restores_recommendation_view() {
        let mut flow = controller();
        flow.present(
            vec![assign(1), delay_manual(2, "F1")],
            Some(packet(assign(1))),
        );
        flow.manual_override().unwrap();
        assert_eq!(flow.phase(), FlowPhase::ConfiguringDelay);

        flow.cancel_delay().unwrap();
        let decision = flow.decision().unwrap();
        assert_eq!(decision.view, DecisionView::Recommendation);
        assert!(decision.recommendation.is_some());
        assert_eq!(decision.options.len(), 2);
    }

    #[test]
    fn test_manual_override_synthesises_option() {
        let mut flow = controller();
        flow.present(vec![assign(1)], Some(packet(assign(1))));
        flow.manual_override().unwrap();

        let draft = flow.draft().unwrap();
        assert_eq!(draft.option.id, OptionId::from(MANUAL_OVERRIDE_ID));
        assert_eq!(draft.option.title(), Some("Manual delay for F1"));
        assert_eq!(draft.option.action_type, ActionType::DelayManual);
        assert_eq!(draft.option.target_flight(), Some("F1"));
    }

    #[test]
    fn test_manual_override_needs_target_flight() {
        let mut flow = controller();
        let strategy = ResolutionOption::new(1, ActionType::Cancel);
        flow.present(vec![strategy.clone()], Some(packet(strategy)));
        assert!(flow.manual_override().is_err());
        assert_eq!(flow.phase(), FlowPhase::AwaitingDecision);
    }

    #[test]
    fn test_approve_delay_manual_recommendation_configures() {
        let mut flow = controller();
        let strategy = delay_manual(4, "F7");
        flow.present(vec![strategy.clone()], Some(packet(strategy)));
        let step = flow.approve_recommendation().unwrap();
        assert_eq!(step, FlowStep::Moved(FlowPhase::ConfiguringDelay));
    }

    #[test]
    fn test_view_all_keeps_options_and_packet() {
        let mut flow = controller();
        flow.present(vec![assign(1), assign(2)], Some(packet(assign(1))));
        flow.view_all_options().unwrap();
        let decision = flow.decision().unwrap();
        assert_eq!(decision.view, DecisionView::AllOptions);
        assert_eq!(decision.options.len(), 2);
        assert_eq!(flow.select_option("2").unwrap(), FlowStep::Submit(assign(2)));
    }

    #[test]
    fn test_actions_rejected_when_idle() {
        let mut flow = controller();
        assert!(matches!(
            flow.select_option("1"),
            Err(AeroError::InvalidTransition { .. })
        ));
        assert!(flow.approve_recommendation().is_err());
        assert!(flow.confirm_delay().is_err());
        assert!(flow.cancel_delay().is_err());
        assert!(flow.set_delay_minutes("30").is_err());
    }

    #[test]
    fn test_unknown_option() {
        let mut flow = controller();
        flow.present(vec![assign(1)], None);
        assert!(matches!(
            flow.select_option("9"),
            Err(AeroError::UnknownOption(_))
        ));
    }

    #[test]
    fn test_present_discards_draft() {
        let mut flow = controller();
        flow.present(vec![delay_manual(1, "F1")], None);
        flow.select_option("1").unwrap();
        flow.present(vec![assign(2)], None);
        assert_eq!(flow.phase(), FlowPhase::AwaitingDecision);
        assert!(flow.draft().is_none());
    }

    #[test]
    fn test_auto_candidate_prefers_resolvable_recommendation() {
        let mut flow = controller();
        flow.present(vec![delay_manual(1, "F1"), assign(2)], Some(packet(assign(2))));
        assert_eq!(flow.auto_candidate(), Some(assign(2)));

        flow.present(
            vec![delay_manual(1, "F1"), assign(3)],
            Some(packet(delay_manual(1, "F1"))),
        );
        assert_eq!(flow.auto_candidate(), Some(assign(3)));

        flow.present(vec![delay_manual(1, "F1")], None);
        assert_eq!(flow.auto_candidate(), None);
    }
}
