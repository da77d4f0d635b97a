//! Configuration for the content query service
//!
//! Loaded from a TOML file with two sections:
//!
//! ```toml
//! [query]
//! max_results = 20000
//! filter_uri_queries = false
//! allowed_publishers = ["bbc.co.uk"]
//! slow_query_threshold_ms = 100
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! Missing sections and fields take their defaults.

use crate::content_store::MAX_RESULTS;
use crate::logging::LoggingConfig;
use crate::model::{EnumKey, Publisher};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub query: QuerySettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Result cap for discover queries
    pub max_results: usize,
    /// Trim uri query results instead of only selecting them
    pub filter_uri_queries: bool,
    /// Publisher keys queries may see; empty allows all
    pub allowed_publishers: Vec<String>,
    /// Slow query threshold in milliseconds
    pub slow_query_threshold_ms: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULTS,
            filter_uri_queries: false,
            allowed_publishers: Vec::new(),
            slow_query_threshold_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl StoreConfig {
    /// Load configuration, falling back to defaults if the file is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: StoreConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = self.to_toml()?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        if self.query.max_results == 0 {
            bail!("Max results cannot be 0");
        }

        self.allowed_publishers()?;

        Ok(())
    }

    /// Configured publisher allow-list, `None` when every publisher is allowed
    pub fn allowed_publishers(&self) -> Result<Option<Vec<Publisher>>> {
        if self.query.allowed_publishers.is_empty() {
            return Ok(None);
        }

        self.query
            .allowed_publishers
            .iter()
            .map(|key| Publisher::from_key(key).with_context(|| format!("Unknown publisher: {}", key)))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Logging setup derived from both sections
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.logging.level.as_str().to_string(),
            json_format: self.logging.format == LogFormat::Json,
            slow_query_logging: true,
            slow_query_threshold_ms: self.query.slow_query_threshold_ms,
        }
    }
}
