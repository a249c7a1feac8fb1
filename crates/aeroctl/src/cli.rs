//! Command-line definitions

use aero_common::OrchestratorMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aeroctl")]
#[command(about = "Aero - disruption resolution orchestrator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Backend base URL (overrides config and AERO_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Config file to load instead of the default search path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Operating mode
    #[arg(long, global = true, default_value = "auto")]
    pub mode: OrchestratorMode,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand
pub struct GlobalOpts {
    pub backend: Option<String>,
    pub config: Option<PathBuf>,
    pub mode: OrchestratorMode,
}

impl Cli {
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            backend: self.backend.clone(),
            config: self.config.clone(),
            mode: self.mode,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the orchestrator with the interactive console
    Watch {
        /// Page of flights to poll
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Fetch status and one page of data once
    Status {
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Request a heal once in the selected mode
    Heal,

    /// Inject a disruption scenario
    Simulate(SimulateArgs),

    /// Reset the backend dataset
    Seed,

    /// Crew actions
    Crew {
        #[command(subcommand)]
        action: CrewCommand,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Show recorded heal and resolve decisions
    History {
        /// Only the most recent N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
pub struct SimulateArgs {
    /// TECHNICAL, WEATHER, ATC or CREW
    pub kind: String,

    #[arg(long)]
    pub sub_type: Option<String>,

    #[arg(long)]
    pub flight: Option<String>,

    #[arg(long)]
    pub airport: Option<String>,

    #[arg(long)]
    pub severity: Option<String>,
}

#[derive(Subcommand)]
pub enum CrewCommand {
    /// Grant rest to a pilot
    Rest { pilot: String },

    /// Quote the cost of extra duty minutes
    Cost {
        pilot: String,

        #[arg(long)]
        minutes: u32,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write the default configuration
    Init {
        /// Target file (defaults to the user config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}
