//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the lottery engine.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{LotteryError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for
/// as long as the process logs.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()
        .map_err(|e| LotteryError::Config(format!("Failed to install tracing subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log an entrant's action against an event
pub fn log_entrant_action(event_id: &str, entrant_id: &str, action: &str, details: Option<&str>) {
    info!(
        event_id = event_id,
        entrant_id = entrant_id,
        action = action,
        details = details,
        "Entrant action performed"
    );
}

/// Log the outcome of a lottery draw
pub fn log_draw(event_id: &str, requested: usize, invited: usize, shortfall: usize, skipped: usize) {
    if skipped > 0 {
        warn!(
            event_id = event_id,
            requested = requested,
            invited = invited,
            shortfall = shortfall,
            skipped = skipped,
            "Lottery draw completed with skipped entrants"
        );
    } else {
        info!(
            event_id = event_id,
            requested = requested,
            invited = invited,
            shortfall = shortfall,
            "Lottery draw completed"
        );
    }
}

/// Log the result of a notification fan-out
pub fn log_fanout(event_id: &str, category: &str, notified: usize, failed: usize) {
    if failed > 0 {
        warn!(
            event_id = event_id,
            category = category,
            notified = notified,
            failed = failed,
            "Notification fan-out finished with failures"
        );
    } else {
        info!(
            event_id = event_id,
            category = category,
            notified = notified,
            "Notification fan-out finished"
        );
    }
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
