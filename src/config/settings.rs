//! Engine settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::utils::errors::{LotteryError, Result};

const ENV_PREFIX: &str = "EVENTLOTTERY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub messaging: MessagingConfig,
    pub lottery: LotteryConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Push delivery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// When false, messages are only logged
    pub enabled: bool,
    pub function_url: String,
    pub notification_title: String,
    pub timeout_seconds: u64,
    pub rate_limit_per_second: u32,
    pub max_concurrent_sends: usize,
}

/// Draw and notification rules
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub max_message_length: usize,
    pub replacement_attempts: u32,
    /// Fixed RNG seed for reproducible draws
    pub seed: Option<u64>,
    pub winner_message: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
}

/// Moderators allowed to delete any event
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    pub admin_ids: Vec<String>,
}

impl Settings {
    /// Load settings from an optional `config` file and `EVENTLOTTERY__*` environment variables
    pub fn new() -> Result<Self> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| LotteryError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| LotteryError::Config(e.to_string()))
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| LotteryError::Config(e.to_string()))?;

        settings
            .try_deserialize()
            .map_err(|e| LotteryError::Config(e.to_string()))
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<()> {
        super::validation::validate_settings(self)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/eventlottery".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 5,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            function_url: String::new(),
            notification_title: "Event Notification".to_string(),
            timeout_seconds: 10,
            rate_limit_per_second: 50,
            max_concurrent_sends: 16,
        }
    }
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            max_message_length: 500,
            replacement_attempts: 3,
            seed: None,
            winner_message: "Congratulations! You won. Proceed to signup.".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "eventlottery.log".to_string(),
        }
    }
}
