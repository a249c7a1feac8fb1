//! Subcommand implementations

use crate::cli::{GlobalOpts, SimulateArgs};
use aero_common::{AeroConfig, DisruptionKind, SimulationRequest};
use aeroctl::backend::{DisruptionBackend, HttpBackend};
use aeroctl::console::{self, ConsoleInput};
use aeroctl::logging::{DecisionEntry, DecisionLog};
use aeroctl::orchestrator::{
    Command, HealingClient, Notice, Orchestrator, SimulationGateway, StateStore,
};
use aeroctl::output;
use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

fn load_config(global: &GlobalOpts) -> Result<AeroConfig> {
    let mut config = AeroConfig::load(global.config.as_deref())?;
    if let Some(url) = &global.backend {
        config.backend.url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

fn connect(config: &AeroConfig) -> Result<Arc<dyn DisruptionBackend>> {
    let backend = HttpBackend::new(&config.backend)?;
    Ok(Arc::new(backend))
}

fn gateway(global: &GlobalOpts) -> Result<SimulationGateway> {
    let config = load_config(global)?;
    Ok(SimulationGateway::new(connect(&config)?))
}

// ============================================================================
// watch
// ============================================================================

pub async fn watch(global: &GlobalOpts, page: u32) -> Result<()> {
    if page == 0 {
        bail!(aero_common::AeroError::InvalidInput("pages start at 1".into()));
    }
    let config = load_config(global)?;
    let backend = connect(&config)?;
    let audit = DecisionLog::from_config(&config.audit);

    println!(
        "{} watching {} in {} mode (help for commands)",
        "aeroctl".bold(),
        backend.describe(),
        global.mode
    );

    let orchestrator = Orchestrator::new(config, global.mode, backend, audit);
    let handle = orchestrator.handle();
    let mut notices = handle.subscribe();
    let runner = tokio::spawn(orchestrator.run(page));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    if let Some(line) = output::render_notice(&notice) {
                        println!("{}", line);
                    }
                    if matches!(notice, Notice::OptionsPresented { .. }) {
                        let store = handle.store();
                        let store = store.read().await;
                        print!("{}", output::render_flow(&store.flow));
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "console fell behind notices"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match console::parse_line(&line) {
                    Ok(ConsoleInput::Run(command)) => match handle.execute(command).await {
                        Ok(reply) => {
                            output::display_success(&output::render_reply(&reply));
                            let store = handle.store();
                            let store = store.read().await;
                            print!("{}", output::render_flow(&store.flow));
                        }
                        Err(e) => output::display_error(&e.to_string()),
                    },
                    Ok(ConsoleInput::Show) => {
                        let store = handle.store();
                        let store = store.read().await;
                        print!("{}", output::render_dashboard(&store));
                    }
                    Ok(ConsoleInput::Help) => output::display_help(),
                    Ok(ConsoleInput::Quit) => break,
                    Ok(ConsoleInput::Empty) => {}
                    Err(e) => output::display_error(&e.to_string()),
                }
            }
        }
    }

    if let Err(e) = handle.execute(Command::Shutdown).await {
        warn!(error = %e, "orchestrator already stopped");
    }
    runner.await.context("Orchestrator task panicked")?;
    Ok(())
}

// ============================================================================
// One-shot commands
// ============================================================================

pub async fn status(global: &GlobalOpts, page: u32, json: bool) -> Result<()> {
    let config = load_config(global)?;
    let backend = connect(&config)?;

    let (data, status) = tokio::join!(
        backend.fetch_data(page.max(1), config.polling.page_size),
        backend.fetch_status()
    );
    let status = status?;
    let data = data?;

    if json {
        let body = serde_json::json!({ "status": status, "data": data });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let mut store = StateStore::new(global.mode, page, &config.orchestrator);
    store.apply_data(data);
    store.apply_status(status);
    print!("{}", output::render_dashboard(&store));
    Ok(())
}

pub async fn heal(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let audit = DecisionLog::from_config(&config.audit);
    let healer = HealingClient::new(connect(&config)?);

    match healer.request(global.mode).await {
        Ok(outcome) => {
            audit.record(&DecisionEntry::new("heal", global.mode).outcome(outcome.label()));
            println!("{}", output::render_heal(&outcome));
            Ok(())
        }
        Err(e) => {
            audit.record(&DecisionEntry::new("heal", global.mode).failed(&e));
            Err(e.into())
        }
    }
}

pub async fn simulate(global: &GlobalOpts, args: &SimulateArgs) -> Result<()> {
    let mut request = SimulationRequest::new(DisruptionKind::from(args.kind.clone()));
    request.sub_type = args.sub_type.clone();
    request.flight_id = args.flight.clone();
    request.airport = args.airport.clone();
    request.severity = args.severity.clone();

    let ack = gateway(global)?.simulate(&request).await?;
    output::display_success(&output::render_ack(&ack));
    Ok(())
}

pub async fn seed(global: &GlobalOpts) -> Result<()> {
    let ack = gateway(global)?.seed().await?;
    output::display_success(&output::render_ack(&ack));
    Ok(())
}

pub async fn grant_rest(global: &GlobalOpts, pilot: &str) -> Result<()> {
    let ack = gateway(global)?.grant_rest(pilot).await?;
    output::display_success(&output::render_ack(&ack));
    Ok(())
}

pub async fn quote_overtime(global: &GlobalOpts, pilot: &str, minutes: u32) -> Result<()> {
    let quote = gateway(global)?.quote_overtime(pilot, minutes).await?;
    print!("{}", output::render_quote(&quote));
    Ok(())
}

// ============================================================================
// config / history
// ============================================================================

pub fn config_init(path: Option<&Path>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => AeroConfig::user_config_path()
            .context("No config directory available, pass --path")?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AeroConfig::default().save(&path)?;
    output::display_success(&format!("wrote {}", path.display()));
    Ok(())
}

pub fn config_show(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

pub fn history(global: &GlobalOpts, limit: Option<usize>) -> Result<()> {
    let config = load_config(global)?;
    let log = DecisionLog::from_config(&config.audit);
    let entries = log.read_all().context("Failed to read decision log")?;
    if entries.is_empty() {
        println!("no decisions recorded");
        return Ok(());
    }

    let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
    for entry in entries.iter().skip(skip) {
        let tag = if entry.ok {
            "[OK]".bright_green().to_string()
        } else {
            "[ERROR]".red().to_string()
        };
        let option = entry
            .option_id
            .as_deref()
            .map(|id| {
                format!(
                    " option {} {}",
                    id,
                    entry.action_type.as_deref().unwrap_or("")
                )
            })
            .unwrap_or_default();
        let detail = entry
            .error
            .as_deref()
            .or(entry.outcome.as_deref())
            .unwrap_or("");
        println!(
            "{} {} {:<12} {:<6}{} {}",
            entry.ts.dimmed(),
            tag,
            entry.event,
            entry.mode.as_str(),
            option,
            detail
        );
    }
    Ok(())
}
