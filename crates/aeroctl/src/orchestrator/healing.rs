//! Healing Protocol Client
//!
//! Issues `/heal` with the current mode and classifies the reply.

use super::flow::FlowController;
use crate::backend::DisruptionBackend;
use aero_common::{
    AeroError, AgentNode, HealResponse, OrchestratorMode, RecommendationPacket, ResolutionOption,
    HEAL_NO_ACTION,
};
use std::sync::Arc;
use tracing::info;

/// Classified `/heal` reply
#[derive(Debug, Clone, PartialEq)]
pub enum HealOutcome {
    /// Crisis handled server-side (or nothing to heal)
    Applied {
        status: String,
        message: Option<String>,
    },
    /// Operator or policy must choose; `options` is never empty
    OptionsGenerated {
        options: Vec<ResolutionOption>,
        recommendation: Option<RecommendationPacket>,
        agent_nodes: Vec<AgentNode>,
    },
}

impl HealOutcome {
    /// Options decide the shape; the status string is informational.
    /// A recommendation without options becomes the sole option.
    pub fn classify(response: HealResponse) -> Self {
        let recommendation = response.recommendation();
        let mut options = response.options.unwrap_or_default();

        if options.is_empty() {
            if let Some(packet) = &recommendation {
                options.push(packet.recommended_strategy.clone());
            }
        }

        if options.is_empty() {
            HealOutcome::Applied {
                status: response.status,
                message: response.message,
            }
        } else {
            HealOutcome::OptionsGenerated {
                options,
                recommendation,
                agent_nodes: response.agent_nodes.unwrap_or_default(),
            }
        }
    }

    pub fn is_no_action(&self) -> bool {
        matches!(self, HealOutcome::Applied { status, .. } if status == HEAL_NO_ACTION)
    }

    /// Applied heals (other than NO_ACTION) re-arm the crisis edge
    pub fn rearms(&self) -> bool {
        matches!(self, HealOutcome::Applied { .. }) && !self.is_no_action()
    }

    pub fn label(&self) -> &str {
        match self {
            HealOutcome::Applied { status, .. } => status,
            HealOutcome::OptionsGenerated { .. } => "OPTIONS_GENERATED",
        }
    }

    /// Write the outcome into the flow controller
    pub fn apply(&self, flow: &mut FlowController, mode: OrchestratorMode, preserve_in_manual: bool) {
        match self {
            HealOutcome::Applied { .. } => {
                if !(preserve_in_manual && mode == OrchestratorMode::Manual) {
                    flow.clear();
                }
            }
            HealOutcome::OptionsGenerated {
                options,
                recommendation,
                ..
            } => flow.present(options.clone(), recommendation.clone()),
        }
    }
}

pub struct HealingClient {
    backend: Arc<dyn DisruptionBackend>,
}

impl HealingClient {
    pub fn new(backend: Arc<dyn DisruptionBackend>) -> Self {
        Self { backend }
    }

    /// No automatic retry; the detector decides when to ask again
    pub async fn request(&self, mode: OrchestratorMode) -> Result<HealOutcome, AeroError> {
        let response = self.backend.heal(mode).await?;
        let outcome = HealOutcome::classify(response);
        match &outcome {
            HealOutcome::Applied { status, message } => {
                info!(%mode, status = %status, message = message.as_deref().unwrap_or(""), "heal applied");
            }
            HealOutcome::OptionsGenerated {
                options,
                recommendation,
                ..
            } => {
                info!(
                    %mode,
                    options = options.len(),
                    recommended = recommendation.is_some(),
                    "heal generated options"
                );
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aero_common::{ActionType, OrchestratorConfig};
    use serde_json::json;

    fn response(body: serde_json::Value) -> HealResponse {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_healed_is_applied() {
        let outcome =
            HealOutcome::classify(response(json!({"status": "HEALED", "message": "Applied Assign P-1"})));
        assert!(matches!(outcome, HealOutcome::Applied { .. }));
        assert!(outcome.rearms());
    }

    #[test]
    fn test_empty_options_is_applied() {
        let outcome = HealOutcome::classify(response(json!({"status": "OPTIONS_GENERATED", "options": []})));
        assert!(matches!(outcome, HealOutcome::Applied { .. }));
    }

    #[test]
    fn test_no_action_does_not_rearm() {
        let outcome = HealOutcome::classify(response(json!({"status": "NO_ACTION"})));
        assert!(outcome.is_no_action());
        assert!(!outcome.rearms());
    }

    #[test]
    fn test_recommendation_without_options_becomes_sole_option() {
        let outcome = HealOutcome::classify(response(json!({
            "status": "OPTIONS_GENERATED",
            "recommended_strategy": {"id": "R1", "action_type": "SWAP_FLIGHT", "payload": {"flight_id": "F1"}}
        })));
        match outcome {
            HealOutcome::OptionsGenerated {
                options,
                recommendation,
                ..
            } => {
                assert_eq!(options.len(), 1);
                assert_eq!(options[0].action_type, ActionType::SwapFlight);
                assert!(recommendation.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_applied_in_manual_preserves_when_configured() {
        let mut flow = FlowController::new(&OrchestratorConfig::default());
        flow.present(vec![ResolutionOption::new(1, ActionType::Cancel)], None);

        let applied = HealOutcome::Applied {
            status: "HEALED".into(),
            message: None,
        };
        applied.apply(&mut flow, OrchestratorMode::Manual, true);
        assert_eq!(flow.pending_options().len(), 1);

        applied.apply(&mut flow, OrchestratorMode::Auto, true);
        assert!(flow.pending_options().is_empty());
    }
}
