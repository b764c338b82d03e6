//! Sport kinds known to the service

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// The fixed set of sports the service offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SportKind {
    Running,
    Cycling,
    Boxing,
    Soccer,
}

impl SportKind {
    pub const ALL: [SportKind; 4] = [
        SportKind::Running,
        SportKind::Cycling,
        SportKind::Boxing,
        SportKind::Soccer,
    ];

    /// Lower-case key used in URLs and payload tags
    pub fn as_str(&self) -> &'static str {
        match self {
            SportKind::Running => "running",
            SportKind::Cycling => "cycling",
            SportKind::Boxing => "boxing",
            SportKind::Soccer => "soccer",
        }
    }

    /// Root element of an entry payload for this sport (e.g. `entryrunning`)
    pub fn entry_tag(&self) -> String {
        format!("entry{}", self.as_str())
    }

    /// Entries of every sport but soccer count rounds
    pub fn has_rounds(&self) -> bool {
        !matches!(self, SportKind::Soccer)
    }

    /// Only boxing rounds have a fixed duration
    pub fn has_round_duration(&self) -> bool {
        matches!(self, SportKind::Boxing)
    }

    /// Running and cycling entries describe a course
    pub fn has_course(&self) -> bool {
        matches!(self, SportKind::Running | SportKind::Cycling)
    }

    pub fn has_bicycle_type(&self) -> bool {
        matches!(self, SportKind::Cycling)
    }
}

impl fmt::Display for SportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(SportKind::Running),
            "cycling" => Ok(SportKind::Cycling),
            "boxing" => Ok(SportKind::Boxing),
            "soccer" => Ok(SportKind::Soccer),
            other => Err(Error::UnknownSport(other.to_string())),
        }
    }
}
