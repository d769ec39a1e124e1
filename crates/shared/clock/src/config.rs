//! Configuration loading for manual clocks
//!
//! Lets a test suite keep its scenario start time in a JSON fixture
//! instead of hard-coding it in every test.

use chrono::{DateTime, Utc};
use crown_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings for a [`crate::ManualClock`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Clock name, used as the log prefix
    #[serde(default = "default_clock_name")]
    pub name: String,

    /// Logical start time (RFC 3339)
    #[serde(default = "default_start")]
    pub start: Timestamp,
}

fn default_clock_name() -> String {
    "ManualClock".to_string()
}

// No wall-clock default: the epoch keeps unconfigured clocks reproducible
fn default_start() -> Timestamp {
    DateTime::<Utc>::default()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            name: default_clock_name(),
            start: default_start(),
        }
    }
}

impl ClockConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),
}
