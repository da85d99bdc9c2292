//! Enumerations and field types shared by templates and remote payloads.
//!
//! Wire names follow the remote service exactly (`ASAP`, `HIGH`, `SOFT`, ...),
//! while the CLI accepts the kebab-case spelling clap derives.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Priority classification understood by the remote service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Asap,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All priorities in the order the remote service lists them.
    pub const ALL: [Priority; 4] = [Priority::Asap, Priority::High, Priority::Medium, Priority::Low];

    /// Wire spelling, e.g. `"HIGH"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Asap => "ASAP",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Case-insensitive parse of the wire spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == upper)
            .ok_or_else(|| format!("unknown priority '{}'", s.trim()))
    }
}

/// How strictly the auto-scheduler treats a task's due date. Replayed
/// tasks are always scheduled against a soft deadline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeadlineType {
    Soft,
}
