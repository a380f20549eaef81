//! Configuration validation module
//!
//! This module provides validation functions for engine configuration
//! to ensure all required settings are properly configured.

use url::Url;
use crate::utils::errors::{LotteryError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_messaging_config(&settings.messaging)?;
    validate_lottery_config(&settings.lottery)?;
    validate_logging_config(&settings.logging)?;
    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(LotteryError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(LotteryError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(LotteryError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate push delivery configuration
fn validate_messaging_config(config: &super::MessagingConfig) -> Result<()> {
    if config.max_concurrent_sends == 0 {
        return Err(LotteryError::Config(
            "Max concurrent sends must be greater than 0".to_string()
        ));
    }

    if config.rate_limit_per_second == 0 {
        return Err(LotteryError::Config(
            "Rate limit must be greater than 0".to_string()
        ));
    }

    if !config.enabled {
        return Ok(());
    }

    if config.function_url.is_empty() {
        return Err(LotteryError::Config(
            "Push function URL is required when messaging is enabled".to_string()
        ));
    }

    let url = Url::parse(&config.function_url)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(LotteryError::Config(
            format!("Push function URL must use http or https, got {}", url.scheme())
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(LotteryError::Config(
            "Messaging timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate lottery configuration
fn validate_lottery_config(config: &super::LotteryConfig) -> Result<()> {
    if config.max_message_length == 0 {
        return Err(LotteryError::Config(
            "Max message length must be greater than 0".to_string()
        ));
    }

    if config.replacement_attempts == 0 {
        return Err(LotteryError::Config(
            "Replacement attempts must be at least 1".to_string()
        ));
    }

    if config.winner_message.trim().is_empty() {
        return Err(LotteryError::Config(
            "Winner message must not be empty".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(LotteryError::Config(
            format!("Invalid log level: {}", config.level)
        ));
    }

    if config.directory.is_empty() {
        return Err(LotteryError::Config(
            "Log directory is required".to_string()
        ));
    }

    Ok(())
}
