//! Sports commands - list and inspect sports

use anyhow::{Context, Result};
use clap::Subcommand;
use coach_core::{ListOptions, Sport, SportKind};
use colored::Colorize;
use serde::Serialize;

use super::get_client;
use crate::output;

#[derive(Subcommand)]
pub enum SportsCommands {
    /// List sports
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a sport
    Show {
        /// Sport key (running, cycling, boxing, soccer)
        sport: SportKind,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SportOutput<'a> {
    sport: &'static str,
    id: Option<u64>,
    name: Option<&'a str>,
    description: Option<&'a str>,
}

pub fn run(command: SportsCommands) -> Result<()> {
    match command {
        SportsCommands::List { json } => list(json),
        SportsCommands::Show { sport, json } => show(sport, json),
    }
}

fn list(json: bool) -> Result<()> {
    let client = get_client()?;
    let sports = Sport::list(&client, ListOptions::everything()).context("Failed to list sports")?;
    tracing::debug!(count = sports.len(), "sports listed");

    if json {
        let keys: Vec<&str> = sports.iter().map(|s| s.kind().as_str()).collect();
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    for sport in &sports {
        println!("  • {}", sport);
    }
    Ok(())
}

fn show(kind: SportKind, json: bool) -> Result<()> {
    let client = get_client()?;
    let sport = client
        .get_sport(kind)
        .with_context(|| format!("Failed to fetch sport '{}'", kind))?;

    if json {
        let output = SportOutput {
            sport: sport.kind().as_str(),
            id: sport.id(),
            name: sport.name(),
            description: sport.description(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", output::or_dash(sport.name()).bold());
    if let Some(description) = sport.description() {
        println!("{}", description);
    }
    Ok(())
}
