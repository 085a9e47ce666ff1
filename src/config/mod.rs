//! Configuration module
//!
//! Handles loading and managing runner configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{DisttestError, Result};
use crate::utils::LogLevel;

/// Execution mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Local,
    Distributed,
}

impl RunMode {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "local" => Some(RunMode::Local),
            "distributed" | "dist" => Some(RunMode::Distributed),
            _ => None,
        }
    }
}

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Name of the registered suite
    pub suite_name: String,

    /// Execution mode
    pub mode: RunMode,

    /// Worker count for distributed runs
    pub nodes: usize,

    /// Bound on a whole distributed run, in seconds
    pub timeout_secs: u64,

    /// Verbose console output
    pub verbose: bool,

    /// Draw a progress bar on the console
    pub show_progress: bool,

    /// Write a JSON run log when set
    pub json_log: Option<JsonLogConfig>,

    /// Log level for the tracing subscriber
    pub log_level: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            suite_name: "default-suite".to_string(),
            mode: RunMode::Local,
            nodes: 3,
            timeout_secs: 600,
            verbose: false,
            show_progress: true,
            json_log: None,
            log_level: "info".to_string(),
        }
    }
}

/// JSON log plugin settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonLogConfig {
    pub log_dir: PathBuf,
    pub log_name: Option<String>,
}

impl Default for JsonLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_name: None,
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

impl RunnerConfig {
    /// Load configuration from a YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML or JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.nodes == 0 {
            return Err(DisttestError::Config("nodes must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(DisttestError::Config(
                "timeout_secs must be at least 1".into(),
            ));
        }
        self.log_level.parse::<LogLevel>()?;
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
