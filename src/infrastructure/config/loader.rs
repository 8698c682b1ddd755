use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{Config, SlotConfig};
use crate::domain::models::LogFormat;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Log directory cannot be empty when set")]
    EmptyLogDir,

    #[error("Invalid request_timeout_ms: {0}. Must be at least 1")]
    InvalidRequestTimeout(u64),

    #[error("Invalid invalidation_period_ms for slot {slot}: {period_ms}. Must be at least 1")]
    InvalidInvalidationPeriod { slot: &'static str, period_ms: u64 },

    #[error("Invalid event_buffer: {0}. Must be at least 1")]
    InvalidEventBuffer(usize),

    #[error("Logging is fully disabled: set log_dir or enable_stderr (format {0:?})")]
    NoLogOutput(LogFormat),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .dbconsole/config.yaml (project config)
    /// 3. .dbconsole/local.yaml (local overrides, optional)
    /// 4. Environment variables (DBCONSOLE_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".dbconsole/config.yaml"))
            .merge(Yaml::file(".dbconsole/local.yaml"))
            .merge(Env::prefixed("DBCONSOLE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("DBCONSOLE_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config
            .logging
            .log_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyLogDir);
        }

        if config.logging.log_dir.is_none() && !config.logging.enable_stderr {
            return Err(ConfigError::NoLogOutput(config.logging.format));
        }

        if config.cache.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidRequestTimeout(
                config.cache.request_timeout_ms,
            ));
        }

        let slots: [(&'static str, &SlotConfig); 3] = [
            ("job", &config.cache.job),
            ("jobProfiler", &config.cache.job_profiler),
            ("userSQLRoles", &config.cache.user_sql_roles),
        ];
        for (slot, slot_config) in slots {
            if slot_config.invalidation_period_ms == Some(0) {
                return Err(ConfigError::InvalidInvalidationPeriod { slot, period_ms: 0 });
            }
        }

        if config.event_buffer == 0 {
            return Err(ConfigError::InvalidEventBuffer(config.event_buffer));
        }

        Ok(())
    }
}
