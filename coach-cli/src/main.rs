//! Coach CLI - the CyberCoach service from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{auth, config, demo, entries, partnerships, sports, users};

/// Coach - inspect and drive a CyberCoach service
#[derive(Parser)]
#[command(name = "coach", version, about, long_about = None)]
struct Cli {
    /// Log HTTP exchanges to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the credentials of a user
    Auth {
        /// Username to check
        username: String,
        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse users
    Users {
        #[command(subcommand)]
        command: users::UsersCommands,
    },

    /// Browse sports
    Sports {
        #[command(subcommand)]
        command: sports::SportsCommands,
    },

    /// Browse and manage partnerships
    Partnerships {
        #[command(subcommand)]
        command: partnerships::PartnershipsCommands,
    },

    /// Browse entries
    Entries {
        #[command(subcommand)]
        command: entries::EntriesCommands,
    },

    /// Show or change the service location
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("coach_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Auth { username, password, json } => auth::run(&username, password, json),
        Commands::Users { command } => users::run(command),
        Commands::Sports { command } => sports::run(command),
        Commands::Partnerships { command } => partnerships::run(command),
        Commands::Entries { command } => entries::run(command),
        Commands::Config { command } => config::run(command),
        Commands::Demo { command } => demo::run(command),
    }
}
