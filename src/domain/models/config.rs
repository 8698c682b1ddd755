use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the console
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LogConfig,

    /// Cache store configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Capacity of the store event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

const fn default_event_buffer() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LogConfig::default(),
            cache: CacheConfig::default(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Cache store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Timeout applied to every fetch, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Policy of the `job` slot
    #[serde(default)]
    pub job: SlotConfig,

    /// Policy of the `jobProfiler` slot
    #[serde(default)]
    pub job_profiler: SlotConfig,

    /// Policy of the `userSQLRoles` slot
    #[serde(default = "default_user_sql_roles_slot")]
    pub user_sql_roles: SlotConfig,
}

const fn default_request_timeout_ms() -> u64 {
    60_000
}

const fn default_user_sql_roles_slot() -> SlotConfig {
    SlotConfig {
        invalidation_period_ms: Some(60_000),
    }
}

impl CacheConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            job: SlotConfig::default(),
            job_profiler: SlotConfig::default(),
            user_sql_roles: default_user_sql_roles_slot(),
        }
    }
}

/// Per-slot cache policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SlotConfig {
    /// After a successful fetch, mark the entry stale once this period
    /// elapses. While valid within the period, refreshes are skipped.
    #[serde(default)]
    pub invalidation_period_ms: Option<u64>,
}

impl SlotConfig {
    pub fn invalidation_period(&self) -> Option<Duration> {
        self.invalidation_period_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// Directory for log files (optional, if None logs only to stderr)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Enable stderr logging
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// Log rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}

const fn default_true() -> bool {
    true
}
