//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_coach_dir, get_config};

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let coach_dir = get_coach_dir()?;
    let mut config = get_config()?;

    match command {
        Some(DemoCommands::On) => {
            config.enable_demo_mode();
            config.save(&coach_dir)?;
            tracing::info!(dir = ?coach_dir, "demo mode enabled");
            println!("{}", "Demo mode enabled".green());
            println!("Commands now run against a built-in service. Try 'coach users list'.");
            Ok(())
        }
        Some(DemoCommands::Off) => {
            config.disable_demo_mode();
            config.save(&coach_dir)?;
            tracing::info!(dir = ?coach_dir, "demo mode disabled");
            println!("{}", "Demo mode disabled".yellow());
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if config.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
