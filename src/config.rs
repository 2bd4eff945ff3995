//! Session settings, loaded from TOML.

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BAD_DATA_MESSAGE: &str = "Sie haben falsche Kartendaten eingegeben.";
pub const DEFAULT_TIMEOUT_MESSAGE: &str =
    "Die Überprüfung hat zu lange gedauert. Bitte versuchen Sie es erneut.";
pub const DEFAULT_PENDING_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a submission may stay pending before it is failed locally.
    pub pending_timeout_ms: u64,
    pub bad_data_message: String,
    pub timeout_message: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            pending_timeout_ms: DEFAULT_PENDING_TIMEOUT_MS,
            bad_data_message: DEFAULT_BAD_DATA_MESSAGE.to_string(),
            timeout_message: DEFAULT_TIMEOUT_MESSAGE.to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Human,
        }
    }
}

impl SessionConfig {
    pub fn from_toml(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    pub fn pending_timeout(&self) -> Duration {
        Duration::from_millis(self.pending_timeout_ms)
    }
}
