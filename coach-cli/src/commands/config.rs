//! Config commands - show or change the service location

use anyhow::Result;
use clap::Subcommand;
use coach_core::Config;
use colored::Colorize;
use serde::Serialize;

use super::{get_coach_dir, get_config};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point the client at another service host
    SetHost {
        host: String,
        /// Resource root on the host
        #[arg(long)]
        path: Option<String>,
    },
}

/// JSON output, keyed like settings.json
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigOutput<'a> {
    host: &'a str,
    path: &'a str,
    list_all_size: usize,
    timeout_secs: u64,
    demo_mode: bool,
}

impl<'a> From<&'a Config> for ConfigOutput<'a> {
    fn from(config: &'a Config) -> Self {
        Self {
            host: &config.host,
            path: &config.path,
            list_all_size: config.list_all_size,
            timeout_secs: config.timeout_secs,
            demo_mode: config.demo_mode,
        }
    }
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => {
            let config = get_config()?;
            if json {
                let output = ConfigOutput::from(&config);
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.add_row(vec!["Service".to_string(), config.url()]);
            table.add_row(vec!["List-all size".to_string(), config.list_all_size.to_string()]);
            table.add_row(vec!["Timeout".to_string(), format!("{}s", config.timeout_secs)]);
            let demo = if config.demo_mode { "ON".green() } else { "OFF".yellow() };
            table.add_row(vec!["Demo mode".to_string(), demo.to_string()]);
            println!("{}", table);
            Ok(())
        }
        ConfigCommands::SetHost { host, path } => {
            let coach_dir = get_coach_dir()?;
            let mut config = get_config()?;
            config.host = host;
            if let Some(path) = path {
                config.path = path;
            }
            config.save(&coach_dir)?;
            tracing::info!(url = %config.url(), "service location changed");
            output::success(&format!("Service set to {}", config.url()));
            Ok(())
        }
    }
}
