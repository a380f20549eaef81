//! Notification log model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::models::{ParticipantStatus, Timestamp};
use crate::utils::errors::LotteryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Waitlist,
    Winner,
    Cancelled,
    Enrolled,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Waitlist => "waitlist",
            NotificationCategory::Winner => "winner",
            NotificationCategory::Cancelled => "cancelled",
            NotificationCategory::Enrolled => "enrolled",
        }
    }

    /// Category used for a broadcast to a status bucket. Declined entrants
    /// have no bucket.
    pub fn for_bucket(bucket: ParticipantStatus) -> Option<Self> {
        match bucket {
            ParticipantStatus::Waitlisted => Some(NotificationCategory::Waitlist),
            ParticipantStatus::Invited => Some(NotificationCategory::Winner),
            ParticipantStatus::Enrolled => Some(NotificationCategory::Enrolled),
            ParticipantStatus::Cancelled => Some(NotificationCategory::Cancelled),
            ParticipantStatus::Declined => None,
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "waitlist" => Ok(NotificationCategory::Waitlist),
            "winner" => Ok(NotificationCategory::Winner),
            "cancelled" => Ok(NotificationCategory::Cancelled),
            "enrolled" => Ok(NotificationCategory::Enrolled),
            other => Err(LotteryError::CorruptRecord(format!("Unknown notification category: {}", other))),
        }
    }
}

/// Recipient's answer to an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationResponse {
    Accepted,
    Declined,
}

impl InvitationResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationResponse::Accepted => "accepted",
            InvitationResponse::Declined => "declined",
        }
    }
}

impl fmt::Display for InvitationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationResponse {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accepted" => Ok(InvitationResponse::Accepted),
            "declined" => Ok(InvitationResponse::Declined),
            other => Err(LotteryError::CorruptRecord(format!("Unknown invitation response: {}", other))),
        }
    }
}

/// One message sent to one entrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub id: String,
    pub event_id: String,
    pub event_name: String,
    pub entrant_id: String,
    pub message: String,
    pub category: NotificationCategory,
    pub created_at: Timestamp,
    pub read: bool,
    pub response: Option<InvitationResponse>,
    pub responded_at: Option<Timestamp>,
    /// Whether the push leg succeeded
    pub delivered: bool,
}

impl NotificationEntry {
    pub fn new(
        event_id: &str,
        event_name: &str,
        entrant_id: &str,
        message: &str,
        category: NotificationCategory,
        created_at: Timestamp,
        delivered: bool,
    ) -> Self {
        Self {
            id: crate::utils::helpers::generate_uuid(),
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
            entrant_id: entrant_id.to_string(),
            message: message.to_string(),
            category,
            created_at,
            read: false,
            response: None,
            responded_at: None,
            delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_categories() {
        assert_eq!(NotificationCategory::for_bucket(ParticipantStatus::Invited), Some(NotificationCategory::Winner));
        assert_eq!(NotificationCategory::for_bucket(ParticipantStatus::Waitlisted), Some(NotificationCategory::Waitlist));
        assert_eq!(NotificationCategory::for_bucket(ParticipantStatus::Declined), None);
    }

    #[test]
    fn test_new_entry_is_unread() {
        let entry = NotificationEntry::new("e", "Gala", "dev-1", "hi", NotificationCategory::Enrolled, Timestamp(3), false);
        assert!(!entry.read);
        assert!(!entry.delivered);
        assert!(entry.response.is_none());
        assert_eq!(serde_json::to_value(entry.category).unwrap(), serde_json::json!("enrolled"));
    }
}
