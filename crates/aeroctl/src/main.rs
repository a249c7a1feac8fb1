//! aeroctl - CLI for the disruption resolution orchestrator

mod cli;
mod commands;

use aeroctl::{errors, logging, output};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand, CrewCommand};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Watch { page } => commands::watch(&cli.global(), page).await,
        Commands::Status { page, json } => commands::status(&cli.global(), page, json).await,
        Commands::Heal => commands::heal(&cli.global()).await,
        Commands::Simulate(ref args) => commands::simulate(&cli.global(), args).await,
        Commands::Seed => commands::seed(&cli.global()).await,
        Commands::Crew { ref action } => match action {
            CrewCommand::Rest { pilot } => commands::grant_rest(&cli.global(), pilot).await,
            CrewCommand::Cost { pilot, minutes } => {
                commands::quote_overtime(&cli.global(), pilot, *minutes).await
            }
        },
        Commands::Config { ref action } => match action {
            ConfigCommand::Init { path, force } => {
                commands::config_init(path.as_deref(), *force)
            }
            ConfigCommand::Show => commands::config_show(&cli.global()),
        },
        Commands::History { limit } => commands::history(&cli.global(), limit),
    };

    if let Err(e) = result {
        output::display_error(&format!("{:#}", e));
        std::process::exit(errors::exit_code(&e));
    }
}
