//! Event model

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::models::Timestamp;
use crate::utils::errors::LotteryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Open,
    Closed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "draft",
            EventStatus::Open => "open",
            EventStatus::Closed => "closed",
            EventStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = LotteryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(EventStatus::Draft),
            "open" => Ok(EventStatus::Open),
            "closed" => Ok(EventStatus::Closed),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(LotteryError::CorruptRecord(format!("Unknown event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub organizer_id: String,
    /// `None` means unlimited
    pub capacity: Option<u32>,
    pub registration_open: Timestamp,
    pub registration_close: Timestamp,
    pub status: EventStatus,
    pub tags: Vec<String>,
    pub created_at: Timestamp,
}

impl Event {
    /// Open status and `now` inside the inclusive registration window
    pub fn is_registration_open(&self, now: Timestamp) -> bool {
        self.status == EventStatus::Open
            && now >= self.registration_open
            && now <= self.registration_close
    }

    pub fn has_capacity(&self, enrolled: usize) -> bool {
        match self.capacity {
            Some(cap) => enrolled < cap as usize,
            None => true,
        }
    }

    /// Slots left for new invitations, counting pending invitations as taken.
    pub fn open_slots(&self, enrolled: usize, invited: usize) -> Option<usize> {
        self.capacity
            .map(|cap| (cap as usize).saturating_sub(enrolled + invited))
    }

    pub fn is_organizer(&self, user_id: &str) -> bool {
        self.organizer_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub organizer_id: String,
    pub capacity: Option<u32>,
    pub registration_open: Timestamp,
    pub registration_close: Timestamp,
    #[serde(default = "default_status")]
    pub status: EventStatus,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_status() -> EventStatus {
    EventStatus::Open
}
