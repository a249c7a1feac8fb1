//! Console output - plain ASCII lines with color accents

use crate::console::HELP;
use crate::orchestrator::{
    DecisionView, FlowController, HealOutcome, Notice, Reply, ResolutionFlow, StateStore,
};
use aero_common::workflow::{workflow_stages, StageState};
use aero_common::{Ack, OvertimeQuote, ResolutionOption, SystemStatus, THIN_SEPARATOR};
use owo_colors::OwoColorize;

const MAX_FLIGHT_ROWS: usize = 8;

fn status_tag(status: &SystemStatus) -> String {
    if status.is_nominal() {
        format!("[{}]", status).bright_green().to_string()
    } else {
        format!("[{}]", status).bright_red().to_string()
    }
}

pub fn display_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red(), message.red());
}

pub fn display_success(message: &str) {
    println!("{} {}", "[OK]".bright_green(), message);
}

pub fn display_help() {
    println!("Commands:");
    for (usage, what) in HELP {
        println!("  {:<26} {}", usage.cyan(), what);
    }
}

/// Snapshot header, disrupted flights, high-risk crew and pipeline
pub fn render_dashboard(store: &StateStore) -> String {
    let mut out = String::new();
    let details = store
        .status_details()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default();
    out.push_str(&format!(
        "{}{}  mode {}  page {}  flights {}/{}  pilots {}\n",
        status_tag(store.status()),
        details,
        store.mode().bold(),
        store.page(),
        store.flights().len(),
        store.total_flights(),
        store.pilots().len(),
    ));
    out.push_str(&format!("{}\n", THIN_SEPARATOR.dimmed()));

    let disrupted: Vec<_> = store.disrupted_flights().collect();
    if disrupted.is_empty() {
        out.push_str("  no disrupted flights on this page\n");
    }
    for flight in disrupted.iter().take(MAX_FLIGHT_ROWS) {
        let delay = flight
            .effective_delay()
            .map(|m| format!(" +{}m", m))
            .unwrap_or_default();
        let cause = flight
            .disruption_type
            .as_deref()
            .map(|c| format!(" {}", c))
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<10} {:<14} {}{}{}\n",
            flight.reference(),
            flight.route(),
            flight.status.to_string().yellow(),
            delay,
            cause.dimmed()
        ));
    }
    if disrupted.len() > MAX_FLIGHT_ROWS {
        out.push_str(&format!("  ... {} more\n", disrupted.len() - MAX_FLIGHT_ROWS));
    }

    let risky: Vec<_> = store.high_risk_pilots().collect();
    if !risky.is_empty() {
        out.push_str("  high fatigue:");
        for pilot in risky {
            out.push_str(&format!(
                " {} {:.0}%",
                pilot.display_name(),
                pilot.fatigue() * 100.0
            ));
        }
        out.push('\n');
    }

    let stages: Vec<String> = workflow_stages(&store.log_messages())
        .into_iter()
        .map(|stage| match stage.state {
            StageState::Completed => format!("{}", stage.label.green()),
            StageState::Active => format!("{}", stage.label.bright_yellow()),
            StageState::Pending => format!("{}", stage.label.dimmed()),
        })
        .collect();
    out.push_str(&format!("  pipeline: {}\n", stages.join(" > ")));
    out.push_str(&render_flow(&store.flow));
    out
}

fn option_line(option: &ResolutionOption) -> String {
    let mut line = format!(
        "  [{}] {} ({})",
        option.id.to_string().cyan(),
        option.label(),
        option.action_type
    );
    if let Some(description) = option.description() {
        line.push_str(&format!(" - {}", description.dimmed()));
    }
    line
}

/// Resolution panel for the current flow state
pub fn render_flow(flow: &FlowController) -> String {
    let mut out = String::new();
    match flow.state() {
        ResolutionFlow::Idle => {}
        ResolutionFlow::AwaitingDecision(decision) => match (&decision.view, &decision.recommendation) {
            (DecisionView::Recommendation, Some(packet)) => {
                out.push_str(&format!("{}\n", "RECOMMENDED".bright_cyan().bold()));
                out.push_str(&format!("{}\n", option_line(&packet.recommended_strategy)));
                for (i, step) in packet.reasoning_trace.iter().enumerate() {
                    out.push_str(&format!("    {}. {}\n", i + 1, step));
                }
                if let Some(impact) = packet.sustainability_impact.as_ref().filter(|i| !i.is_empty()) {
                    let metrics: Vec<String> = impact
                        .metrics
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    out.push_str(&format!("    impact: {}\n", metrics.join(", ").green()));
                }
                out.push_str(&format!(
                    "  {} approve | all | override ({} options)\n",
                    ">".bold(),
                    decision.options.len()
                ));
            }
            _ => {
                out.push_str(&format!("{}\n", "OPTIONS".bright_cyan().bold()));
                for option in &decision.options {
                    out.push_str(&format!("{}\n", option_line(option)));
                }
                out.push_str(&format!("  {} select <id>\n", ">".bold()));
            }
        },
        ResolutionFlow::ConfiguringDelay { draft, .. } => {
            out.push_str(&format!("{}\n", "MANUAL DELAY".bright_cyan().bold()));
            out.push_str(&format!("{}\n", option_line(&draft.option)));
            out.push_str(&format!(
                "  delay: {} minutes\n  {} minutes <n> | confirm | cancel\n",
                draft.minutes.to_string().bold(),
                ">".bold()
            ));
        }
    }
    out
}

/// One line per notice; `None` for ones the console does not print
pub fn render_notice(notice: &Notice) -> Option<String> {
    let line = match notice {
        Notice::SnapshotUpdated { .. } => return None,
        Notice::CrisisDetected(status) => format!("{} crisis detected", status_tag(status)),
        Notice::HealHeld(_) => format!(
            "{} heal held in MANUAL mode (use heal or mode auto)",
            "[HOLD]".yellow()
        ),
        Notice::Recovered => format!("{} status back to VALID", "[OK]".bright_green()),
        Notice::HealFailed(e) => format!("{} heal failed: {}", "[ERROR]".red(), e),
        Notice::HealApplied { status, message } => format!(
            "{} {}{}",
            "[HEAL]".bright_green(),
            status,
            message
                .as_deref()
                .map(|m| format!(": {}", m))
                .unwrap_or_default()
        ),
        Notice::OptionsPresented { count, recommended } => format!(
            "{} {} option(s){}",
            "[DECIDE]".bright_cyan(),
            count,
            if *recommended { " with a recommendation" } else { "" }
        ),
        Notice::Resolved { option, automatic } => format!(
            "{} {}{}",
            "[RESOLVED]".bright_green(),
            option.label(),
            if *automatic { " (auto)" } else { "" }
        ),
        Notice::ResolveFailed(e) => format!("{} resolve failed: {}", "[ERROR]".red(), e),
        Notice::AwaitingOperator => format!(
            "{} no option can be applied automatically",
            "[WAIT]".yellow()
        ),
    };
    Some(line)
}

pub fn render_heal(outcome: &HealOutcome) -> String {
    match outcome {
        HealOutcome::Applied { status, message } => format!(
            "{} {}",
            status,
            message.as_deref().unwrap_or("")
        ),
        HealOutcome::OptionsGenerated {
            options,
            recommendation,
            ..
        } => {
            let mut out = format!("{} option(s)\n", options.len());
            if let Some(packet) = recommendation {
                out.push_str(&format!(
                    "recommended: {}\n",
                    packet.recommended_strategy.label()
                ));
            }
            for option in options {
                out.push_str(&format!("{}\n", option_line(option)));
            }
            out
        }
    }
}

pub fn render_ack(ack: &Ack) -> String {
    ack.summary()
}

pub fn render_quote(quote: &OvertimeQuote) -> String {
    let mut out = format!(
        "cost {:.2}  projected fatigue {:.0}%  {}\n",
        quote.cost,
        quote.projected_fatigue * 100.0,
        if quote.is_overtime { "OVERTIME".yellow().to_string() } else { "within limits".to_string() }
    );
    for line in &quote.breakdown {
        out.push_str(&format!("  {:<24} {:>10.2}\n", line.category, line.amount));
    }
    if let Some(compliance) = &quote.compliance {
        let show = |v: &Option<serde_json::Value>| {
            v.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "-".into())
        };
        out.push_str(&format!(
            "  rest 48h {}  night flights {}  recent duty {}\n",
            show(&compliance.rest_48h),
            show(&compliance.night_flights),
            show(&compliance.recent_duty)
        ));
    }
    out
}

/// Summary line for a command reply
pub fn render_reply(reply: &Reply) -> String {
    match reply {
        Reply::Flow(phase) => format!("now {}", phase),
        Reply::Resolved { option, ack } => {
            format!("resolved {} ({})", option.label(), render_ack(ack))
        }
        Reply::Minutes(m) => format!("delay set to {} minutes", m),
        Reply::Heal(outcome) => render_heal(outcome),
        Reply::Ack(ack) => render_ack(ack),
        Reply::Quote(quote) => render_quote(quote),
        Reply::Mode(mode) => format!("mode {}", mode),
        Reply::Page(page) => format!("page {}", page),
        Reply::Stopped => "stopped".to_string(),
    }
}
