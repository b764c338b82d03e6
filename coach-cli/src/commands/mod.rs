//! CLI command implementations

pub mod auth;
pub mod config;
pub mod demo;
pub mod entries;
pub mod partnerships;
pub mod sports;
pub mod users;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use coach_core::{Client, Config, ListOptions};
use dialoguer::Password;

/// Get the coach directory from environment or default
pub fn get_coach_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("COACH_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".coach"))
}

/// Load the configuration
pub fn get_config() -> Result<Config> {
    let coach_dir = get_coach_dir()?;
    Config::load(&coach_dir)
        .with_context(|| format!("Failed to load configuration from {:?}", coach_dir))
}

/// Build a client from the configuration
pub fn get_client() -> Result<Client> {
    let config = get_config()?;
    Client::from_config(&config).context("Failed to initialize the service client")
}

/// Get password from the flag, COACH_PASSWORD, or an interactive prompt
pub fn get_password_or_prompt(password_flag: Option<String>, username: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if let Ok(p) = std::env::var("COACH_PASSWORD") {
        return Ok(p);
    }

    if atty::isnt(atty::Stream::Stdin) {
        anyhow::bail!("No password given for '{}'. Use --password or COACH_PASSWORD", username);
    }

    let p = Password::new()
        .with_prompt(format!("Password for {}", username))
        .interact()?;
    Ok(p)
}

/// Paging flags shared by the list commands
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Page size
    #[arg(long)]
    pub size: Option<usize>,
    /// Index of the first item
    #[arg(long, default_value_t = 0)]
    pub start: usize,
    /// Retrieve the whole collection
    #[arg(long)]
    pub all: bool,
    /// Only keep items whose key contains this text
    #[arg(long)]
    pub filter: Option<String>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        let mut options = ListOptions::default().start(self.start).all(self.all);
        if let Some(size) = self.size {
            options = options.size(size);
        }
        options
    }

    pub fn keeps(&self, key: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |needle| key.to_lowercase().contains(&needle.to_lowercase()))
    }
}
