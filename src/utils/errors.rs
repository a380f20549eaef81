//! Error handling for EventLottery
//!
//! This module defines the main error type used throughout the engine
//! and provides a unified error handling strategy.

use thiserror::Error;
use crate::models::ParticipantStatus;

/// Main error type for EventLottery operations
#[derive(Error, Debug)]
pub enum LotteryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registration closed for event {event_id}: {reason}")]
    RegistrationClosed { event_id: String, reason: String },

    #[error("Entrant {entrant_id} already joined event {event_id} (status: {status})")]
    AlreadyJoined { event_id: String, entrant_id: String, status: ParticipantStatus },

    #[error("Entrant {entrant_id} is not on the waitlist for event {event_id}")]
    NotInWaitlist { event_id: String, entrant_id: String },

    #[error("Illegal status transition for entrant {entrant_id}: {from} -> {to}")]
    IllegalTransition { entrant_id: String, from: ParticipantStatus, to: ParticipantStatus },

    #[error("No waitlisted entrants for event {event_id}")]
    EmptyPool { event_id: String },

    #[error("Concurrent update detected for entrant {entrant_id} on event {event_id}")]
    Conflict { event_id: String, entrant_id: String },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: String },

    #[error("Entrant {entrant_id} has no status for event {event_id}")]
    EntrantNotFound { event_id: String, entrant_id: String },

    #[error("Notification not found: {notification_id}")]
    NotificationNotFound { notification_id: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for EventLottery operations
pub type Result<T> = std::result::Result<T, LotteryError>;

impl LotteryError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            LotteryError::Database(_) => false,
            LotteryError::Migration(_) => false,
            LotteryError::Http(_) => true,
            LotteryError::Messaging(_) => true,
            LotteryError::Config(_) => false,
            LotteryError::RegistrationClosed { .. } => false,
            LotteryError::AlreadyJoined { .. } => false,
            LotteryError::NotInWaitlist { .. } => false,
            LotteryError::IllegalTransition { .. } => false,
            LotteryError::EmptyPool { .. } => false,
            LotteryError::Conflict { .. } => true,
            LotteryError::EventNotFound { .. } => false,
            LotteryError::EntrantNotFound { .. } => false,
            LotteryError::NotificationNotFound { .. } => false,
            LotteryError::PermissionDenied(_) => false,
            LotteryError::InvalidInput(_) => false,
            LotteryError::CorruptRecord(_) => false,
            LotteryError::Serialization(_) => false,
            LotteryError::Io(_) => true,
            LotteryError::UrlParse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LotteryError::Database(_) => ErrorSeverity::Critical,
            LotteryError::Migration(_) => ErrorSeverity::Critical,
            LotteryError::Config(_) => ErrorSeverity::Critical,
            LotteryError::CorruptRecord(_) => ErrorSeverity::Critical,
            LotteryError::PermissionDenied(_) => ErrorSeverity::Warning,
            LotteryError::Conflict { .. } => ErrorSeverity::Warning,
            LotteryError::RegistrationClosed { .. }
            | LotteryError::AlreadyJoined { .. }
            | LotteryError::NotInWaitlist { .. }
            | LotteryError::IllegalTransition { .. }
            | LotteryError::EmptyPool { .. }
            | LotteryError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Short message suitable for showing to the person who triggered the action
    pub fn user_message(&self) -> String {
        match self {
            LotteryError::RegistrationClosed { reason, .. } => reason.clone(),
            LotteryError::AlreadyJoined { .. } => "Already joined".to_string(),
            LotteryError::NotInWaitlist { .. } => "You are not on the waitlist".to_string(),
            LotteryError::IllegalTransition { .. } => "This action is not available right now".to_string(),
            LotteryError::EmptyPool { .. } => "No entrants found".to_string(),
            LotteryError::Conflict { .. } => "Someone else updated this entry. Please try again.".to_string(),
            LotteryError::EventNotFound { .. } => "Event not found".to_string(),
            LotteryError::EntrantNotFound { .. } => "You are not registered for this event".to_string(),
            LotteryError::NotificationNotFound { .. } => "Notification not found".to_string(),
            LotteryError::PermissionDenied(reason) | LotteryError::InvalidInput(reason) => reason.clone(),
            _ if self.is_recoverable() => "Something went wrong. Please try again.".to_string(),
            _ => "Something went wrong".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
