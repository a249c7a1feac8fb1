//! Operator console input for `aeroctl watch`

use crate::orchestrator::{Command, GatewayCall};
use aero_common::{AeroError, DisruptionKind, OrchestratorMode, SimulationRequest};

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Run(Command),
    Show,
    Help,
    Quit,
    Empty,
}

pub const HELP: &[(&str, &str)] = &[
    ("select <id>", "choose a pending option"),
    ("approve", "resolve with the recommended strategy"),
    ("all", "show every option instead of the recommendation"),
    ("override", "delay the recommendation's flight manually"),
    ("minutes <n>", "set the manual delay"),
    ("confirm", "submit the manual delay"),
    ("cancel", "back to the options"),
    ("mode <auto|manual>", "switch operating mode"),
    ("page <n>", "poll another page of flights"),
    ("heal", "request a heal now"),
    ("simulate <type> [flight]", "inject a disruption (technical, weather, atc, crew)"),
    ("seed", "reset the dataset"),
    ("rest <pilot>", "grant rest to a pilot"),
    ("cost <pilot> <minutes>", "quote overtime cost"),
    ("show", "print the dashboard"),
    ("help", "this list"),
    ("quit", "stop watching"),
];

fn missing(what: &str) -> AeroError {
    AeroError::InvalidInput(format!("missing {}", what))
}

fn number(raw: &str, what: &str) -> Result<u32, AeroError> {
    raw.parse()
        .map_err(|_| AeroError::InvalidInput(format!("{} must be a whole number, got '{}'", what, raw)))
}

pub fn parse_line(line: &str) -> Result<ConsoleInput, AeroError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ConsoleInput::Empty);
    };
    let args: Vec<&str> = words.collect();
    let arg = |i: usize, what: &str| args.get(i).copied().ok_or_else(|| missing(what));

    let command = match verb.to_ascii_lowercase().as_str() {
        "select" | "s" => Command::Select(arg(0, "option id")?.to_string()),
        "approve" | "a" => Command::Approve,
        "all" => Command::ViewAll,
        "override" => Command::Override,
        // minute validation belongs to the flow controller
        "minutes" | "m" => Command::SetMinutes(arg(0, "minutes")?.to_string()),
        "confirm" => Command::ConfirmDelay,
        "cancel" => Command::CancelDelay,
        "mode" => {
            let mode: OrchestratorMode = arg(0, "mode")?.parse().map_err(AeroError::InvalidInput)?;
            Command::SetMode(mode)
        }
        "page" => Command::SetPage(number(arg(0, "page")?, "page")?),
        "heal" => Command::Heal,
        "simulate" | "sim" => {
            let mut request = SimulationRequest::new(DisruptionKind::from(arg(0, "type")?.to_string()));
            request.flight_id = args.get(1).map(|f| f.to_string());
            Command::Gateway(GatewayCall::Simulate(request))
        }
        "seed" => Command::Gateway(GatewayCall::Seed),
        "rest" => Command::Gateway(GatewayCall::GrantRest(arg(0, "pilot id")?.to_string())),
        "cost" => Command::Gateway(GatewayCall::QuoteOvertime {
            pilot_id: arg(0, "pilot id")?.to_string(),
            minutes: number(arg(1, "minutes")?, "minutes")?,
        }),
        "show" | "ls" => return Ok(ConsoleInput::Show),
        "help" | "?" => return Ok(ConsoleInput::Help),
        "quit" | "exit" | "q" => return Ok(ConsoleInput::Quit),
        other => {
            return Err(AeroError::InvalidInput(format!(
                "unknown command '{}' (try help)",
                other
            )))
        }
    };
    Ok(ConsoleInput::Run(command))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(line: &str) -> Command {
        match parse_line(line).unwrap() {
            ConsoleInput::Run(command) => command,
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_flow_commands() {
        assert_eq!(run("select OPT_2"), Command::Select("OPT_2".into()));
        assert_eq!(run("approve"), Command::Approve);
        assert_eq!(run("  minutes   90 "), Command::SetMinutes("90".into()));
        assert_eq!(run("confirm"), Command::ConfirmDelay);
    }

    #[test]
    fn test_minutes_left_for_flow_validation() {
        assert_eq!(run("minutes ninety"), Command::SetMinutes("ninety".into()));
    }

    #[test]
    fn test_mode_and_page() {
        assert_eq!(run("mode MANUAL"), Command::SetMode(OrchestratorMode::Manual));
        assert_eq!(run("page 3"), Command::SetPage(3));
        assert!(parse_line("page three").is_err());
        assert!(parse_line("mode sometimes").is_err());
    }

    #[test]
    fn test_gateway_commands() {
        let Command::Gateway(GatewayCall::Simulate(request)) = run("simulate weather FLY1001") else {
            panic!("expected simulate");
        };
        assert_eq!(request.kind, DisruptionKind::Weather);
        assert_eq!(request.flight_id.as_deref(), Some("FLY1001"));

        assert_eq!(
            run("cost P-204 120"),
            Command::Gateway(GatewayCall::QuoteOvertime {
                pilot_id: "P-204".into(),
                minutes: 120
            })
        );
    }

    #[test]
    fn test_meta_and_errors() {
        assert_eq!(parse_line("").unwrap(), ConsoleInput::Empty);
        assert_eq!(parse_line("quit").unwrap(), ConsoleInput::Quit);
        assert_eq!(parse_line("show").unwrap(), ConsoleInput::Show);
        assert!(parse_line("select").is_err());
        assert!(parse_line("launch").is_err());
    }
}
