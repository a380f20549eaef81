//! Data models module
//!
//! This module contains all data structures used throughout the engine

pub mod timestamp;
pub mod event;
pub mod entrant;
pub mod notification;
pub mod tag;
pub mod ban;

// Re-export commonly used models
pub use timestamp::{RawTimestamp, Timestamp};
pub use event::{CreateEventRequest, Event, EventStatus};
pub use entrant::{EntrantStatus, ParticipantStatus, StatusTimestamps};
pub use notification::{InvitationResponse, NotificationCategory, NotificationEntry};
pub use tag::{Tag, TagDiff, PREDEFINED_TAGS};
pub use ban::{Ban, BanKind};
