//! Configuration management
//!
//! Settings live in `settings.json` inside the configuration directory:
//! ```json
//! {
//!   "host": "http://diufvm31.unifr.ch:8090",
//!   "path": "/CyberCoachServer/resources/",
//!   "listAllSize": 1000,
//!   "timeoutSecs": 30,
//!   "demoMode": false
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_LIST_ALL_SIZE;

pub const DEFAULT_HOST: &str = "http://diufvm31.unifr.ch:8090";
pub const DEFAULT_PATH: &str = "/CyberCoachServer/resources/";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list_all_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_secs: Option<u64>,
    #[serde(default)]
    demo_mode: bool,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

impl SettingsFile {
    fn read(settings_path: &Path) -> Result<Self> {
        if !settings_path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(settings_path)?;
        Ok(serde_json::from_str(&content).unwrap_or_default())
    }
}

/// Service location and client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub path: String,
    /// Chunk size of list-all scans
    pub list_all_size: usize,
    pub timeout_secs: u64,
    /// Use the built-in in-memory service instead of the network
    pub demo_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path: DEFAULT_PATH.to_string(),
            list_all_size: DEFAULT_LIST_ALL_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            demo_mode: false,
        }
    }
}

impl Config {
    /// Load config from the configuration directory
    ///
    /// Environment variables take precedence over the file:
    /// `COACH_HOST`, `COACH_PATH` and `COACH_DEMO_MODE`.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let raw = SettingsFile::read(&config_dir.join(SETTINGS_FILE))?;
        let defaults = Self::default();

        let host = std::env::var("COACH_HOST")
            .ok()
            .filter(|h| !h.is_empty())
            .or(raw.host)
            .unwrap_or(defaults.host);
        let path = std::env::var("COACH_PATH")
            .ok()
            .filter(|p| !p.is_empty())
            .or(raw.path)
            .unwrap_or(defaults.path);

        let demo_mode = match std::env::var("COACH_DEMO_MODE").ok().as_deref() {
            Some("true" | "1" | "yes" | "TRUE" | "YES") => true,
            Some("false" | "0" | "no" | "FALSE" | "NO") => false,
            _ => raw.demo_mode,
        };

        Ok(Self {
            host,
            path,
            list_all_size: raw.list_all_size.unwrap_or(defaults.list_all_size).max(1),
            timeout_secs: raw.timeout_secs.unwrap_or(defaults.timeout_secs),
            demo_mode,
        })
    }

    /// Save config to the configuration directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(config_dir)?;
        let settings_path = config_dir.join(SETTINGS_FILE);

        let mut settings = SettingsFile::read(&settings_path)?;
        settings.host = Some(self.host.clone());
        settings.path = Some(self.path.clone());
        settings.list_all_size = Some(self.list_all_size);
        settings.timeout_secs = Some(self.timeout_secs);
        settings.demo_mode = self.demo_mode;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL of the service resources
    pub fn url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.path)
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }
}
