//! Entrant participation model

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::models::Timestamp;
use crate::utils::errors::LotteryError;

/// Per-event participation status of one entrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Waitlisted,
    Invited,
    Enrolled,
    Declined,
    Cancelled,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Waitlisted => "waitlisted",
            ParticipantStatus::Invited => "invited",
            ParticipantStatus::Enrolled => "enrolled",
            ParticipantStatus::Declined => "declined",
            ParticipantStatus::Cancelled => "cancelled",
        }
    }

    /// No outgoing edges
    pub fn is_terminal(&self) -> bool {
        matches!(self, ParticipantStatus::Declined | ParticipantStatus::Cancelled)
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "waitlisted" => Ok(ParticipantStatus::Waitlisted),
            "invited" => Ok(ParticipantStatus::Invited),
            "enrolled" => Ok(ParticipantStatus::Enrolled),
            "declined" => Ok(ParticipantStatus::Declined),
            "cancelled" => Ok(ParticipantStatus::Cancelled),
            other => Err(LotteryError::CorruptRecord(format!("Unknown participant status: {}", other))),
        }
    }
}

/// One row per (event, entrant)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrantStatus {
    pub event_id: String,
    pub entrant_id: String,
    pub status: ParticipantStatus,
    pub request_time: Timestamp,
    pub invited_at: Option<Timestamp>,
    pub responded_at: Option<Timestamp>,
    pub is_replacement: bool,
}

impl EntrantStatus {
    pub fn waitlisted(event_id: &str, entrant_id: &str, request_time: Timestamp) -> Self {
        Self {
            event_id: event_id.to_string(),
            entrant_id: entrant_id.to_string(),
            status: ParticipantStatus::Waitlisted,
            request_time,
            invited_at: None,
            responded_at: None,
            is_replacement: false,
        }
    }

    /// Pool order: earliest request first, entrant id breaks ties
    pub fn pool_order(a: &EntrantStatus, b: &EntrantStatus) -> Ordering {
        a.request_time
            .cmp(&b.request_time)
            .then_with(|| a.entrant_id.cmp(&b.entrant_id))
    }

    /// Copy of this row moved to `status`. `request_time` never changes.
    pub fn apply(&self, status: ParticipantStatus, stamps: &StatusTimestamps) -> Self {
        Self {
            status,
            invited_at: stamps.invited_at.or(self.invited_at),
            responded_at: stamps.responded_at.or(self.responded_at),
            is_replacement: stamps.is_replacement.unwrap_or(self.is_replacement),
            ..self.clone()
        }
    }
}

/// Optional field updates carried with a status write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTimestamps {
    pub invited_at: Option<Timestamp>,
    pub responded_at: Option<Timestamp>,
    pub is_replacement: Option<bool>,
}

impl StatusTimestamps {
    pub fn invited(at: Timestamp, replacement: bool) -> Self {
        Self { invited_at: Some(at), responded_at: None, is_replacement: Some(replacement) }
    }

    pub fn responded(at: Timestamp) -> Self {
        Self { invited_at: None, responded_at: Some(at), is_replacement: None }
    }
}
