//! Structured logging with tracing
//!
//! Installs the global subscriber and tracks slow content queries.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Slow queries retained for reporting
const MAX_SLOW_QUERIES: usize = 1000;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub level: String,

    /// Enable JSON format output
    pub json_format: bool,

    /// Enable slow query logging
    pub slow_query_logging: bool,

    /// Slow query threshold in milliseconds
    pub slow_query_threshold_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            json_format: false,
            slow_query_logging: true,
            slow_query_threshold_ms: 100,
        }
    }
}

impl LoggingConfig {
    /// Parse log level from string
    pub fn parse_level(&self) -> Level {
        match self.level.to_uppercase().as_str() {
            "ERROR" => Level::ERROR,
            "WARN" => Level::WARN,
            "INFO" => Level::INFO,
            "DEBUG" => Level::DEBUG,
            "TRACE" => Level::TRACE,
            _ => Level::INFO,
        }
    }

    /// Slow query logger matching this configuration
    pub fn slow_query_logger(&self) -> SlowQueryLogger {
        SlowQueryLogger::new(
            Duration::from_millis(self.slow_query_threshold_ms),
            self.slow_query_logging,
        )
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<SlowQueryLogger> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.parse_level().as_str()));

    let subscriber = Registry::default().with(env_filter);

    let installed = if config.json_format {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_writer(std::io::stderr);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact();
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        level = %config.level,
        json = config.json_format,
        slow_queries = config.slow_query_logging,
        "Logging initialized"
    );

    Ok(config.slow_query_logger())
}

/// Slow query logger
#[derive(Debug, Clone)]
pub struct SlowQueryLogger {
    threshold: Duration,
    enabled: bool,
    queries: Arc<RwLock<Vec<SlowQuery>>>,
}

/// Slow query record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowQuery {
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub query: String,
    pub kind: String,
    pub results: usize,
}

/// Query execution tracker
#[derive(Debug)]
pub struct QueryTracker {
    start_time: Instant,
    query: String,
    kind: String,
}

/// Slow query statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlowQueryStats {
    pub total_count: usize,
    pub avg_duration_ms: u64,
    pub max_duration_ms: u64,
    pub threshold_ms: u64,
}

impl SlowQueryLogger {
    pub fn new(threshold: Duration, enabled: bool) -> Self {
        Self {
            threshold,
            enabled,
            queries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Logger that never records anything
    pub fn disabled() -> Self {
        Self::new(Duration::MAX, false)
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Start tracking a query
    pub fn start_query(&self, query: impl Into<String>, kind: impl Into<String>) -> QueryTracker {
        QueryTracker {
            start_time: Instant::now(),
            query: query.into(),
            kind: kind.into(),
        }
    }

    /// Finish tracking a query and log it if slow
    pub fn finish_query(&self, tracker: QueryTracker, results: usize) {
        if !self.enabled {
            return;
        }

        let duration = tracker.start_time.elapsed();
        if duration < self.threshold {
            return;
        }

        let slow_query = SlowQuery {
            timestamp: Utc::now(),
            duration_ms: duration.as_millis() as u64,
            query: tracker.query,
            kind: tracker.kind,
            results,
        };

        tracing::warn!(
            target: "slow_query",
            duration_ms = slow_query.duration_ms,
            kind = %slow_query.kind,
            query = %slow_query.query,
            results = slow_query.results,
            "Slow query detected"
        );

        let mut queries = self.queries.write();
        queries.push(slow_query);
        if queries.len() > MAX_SLOW_QUERIES {
            let len = queries.len();
            queries.drain(0..len - MAX_SLOW_QUERIES);
        }
    }

    /// Most recent slow queries, newest first
    pub fn get_slow_queries(&self, limit: usize) -> Vec<SlowQuery> {
        let queries = self.queries.read();
        queries.iter().rev().take(limit).cloned().collect()
    }

    pub fn get_stats(&self) -> SlowQueryStats {
        let queries = self.queries.read();
        let threshold_ms = self.threshold.as_millis() as u64;

        if queries.is_empty() {
            return SlowQueryStats {
                threshold_ms,
                ..Default::default()
            };
        }

        let total_count = queries.len();
        let total_duration: u64 = queries.iter().map(|q| q.duration_ms).sum();

        SlowQueryStats {
            total_count,
            avg_duration_ms: total_duration / total_count as u64,
            max_duration_ms: queries.iter().map(|q| q.duration_ms).max().unwrap_or(0),
            threshold_ms,
        }
    }

    pub fn clear(&self) {
        self.queries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LoggingConfig::default();
        assert_eq!(config.parse_level(), Level::INFO);

        config.level = "debug".to_string();
        assert_eq!(config.parse_level(), Level::DEBUG);

        config.level = "loud".to_string();
        assert_eq!(config.parse_level(), Level::INFO);
    }

    #[test]
    fn test_slow_query_recorded_over_threshold() {
        let logger = SlowQueryLogger::new(Duration::ZERO, true);
        let tracker = logger.start_query("version.duration-greaterThan(600)", "discover");
        logger.finish_query(tracker, 3);

        let queries = logger.get_slow_queries(10);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].kind, "discover");
        assert_eq!(queries[0].results, 3);
        assert_eq!(logger.get_stats().total_count, 1);

        logger.clear();
        assert!(logger.get_slow_queries(10).is_empty());
    }

    #[test]
    fn test_fast_and_disabled_queries_ignored() {
        let logger = SlowQueryLogger::new(Duration::from_secs(60), true);
        logger.finish_query(logger.start_query("title(x)", "discover"), 0);
        assert!(logger.get_slow_queries(10).is_empty());

        let disabled = SlowQueryLogger::disabled();
        disabled.finish_query(disabled.start_query("title(x)", "discover"), 0);
        assert!(disabled.get_slow_queries(10).is_empty());
    }

    #[test]
    fn test_slow_queries_capped() {
        let logger = SlowQueryLogger::new(Duration::ZERO, true);
        for i in 0..MAX_SLOW_QUERIES + 5 {
            logger.finish_query(logger.start_query(format!("q{}", i), "uri"), 0);
        }

        let queries = logger.get_slow_queries(usize::MAX);
        assert_eq!(queries.len(), MAX_SLOW_QUERIES);
        assert_eq!(queries[0].query, format!("q{}", MAX_SLOW_QUERIES + 4));
    }
}
