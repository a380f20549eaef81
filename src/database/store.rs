//! Storage seams
//!
//! The engine talks to persistence only through these traits. Every status
//! write is a compare-and-set scoped to one (event, entrant) key.

use async_trait::async_trait;
use crate::models::{
    Ban, BanKind, EntrantStatus, Event, InvitationResponse, NotificationCategory, NotificationEntry,
    ParticipantStatus, StatusTimestamps, Tag, Timestamp,
};
use crate::utils::errors::Result;

/// Result of a conditional status write or delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write happened; carries the row as written (or as deleted)
    Applied(EntrantStatus),
    /// The row did not hold the expected status. `actual` is `None` when
    /// the row does not exist.
    Conflict { actual: Option<ParticipantStatus> },
}

/// Result of an idempotent insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(EntrantStatus),
    Existing(EntrantStatus),
}

/// Events and per-entrant participation rows
#[async_trait]
pub trait LotteryStore: Send + Sync {
    async fn create_event(&self, event: Event) -> Result<Event>;

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>>;

    async fn event_exists(&self, event_id: &str) -> Result<bool>;

    /// Every event created by one organizer, newest first
    async fn events_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>>;

    /// Overwrites the mutable fields of an existing event; fails with
    /// `EventNotFound` when it is gone.
    async fn update_event(&self, event: &Event) -> Result<Event>;

    /// Removes the event and every participation row for it. Returns false
    /// when there was nothing to delete.
    async fn delete_event(&self, event_id: &str) -> Result<bool>;

    /// Point-in-time snapshot of all rows for an event
    async fn get_entrant_statuses(&self, event_id: &str) -> Result<Vec<EntrantStatus>>;

    async fn get_entrant_status(&self, event_id: &str, entrant_id: &str) -> Result<Option<EntrantStatus>>;

    /// Every row for one entrant across events, newest request first
    async fn get_entrant_history(&self, entrant_id: &str) -> Result<Vec<EntrantStatus>>;

    async fn insert_entrant_if_absent(&self, row: EntrantStatus) -> Result<InsertOutcome>;

    async fn delete_entrant_if_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: ParticipantStatus,
    ) -> Result<CasOutcome>;

    /// Moves the row to `new` only if it currently holds `expected`
    /// (`None` matches any existing status).
    async fn compare_and_set_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: Option<ParticipantStatus>,
        new: ParticipantStatus,
        stamps: StatusTimestamps,
    ) -> Result<CasOutcome>;
}

/// Append-only log of sent notifications
#[async_trait]
pub trait NotificationLog: Send + Sync {
    async fn append(&self, entry: NotificationEntry) -> Result<()>;

    async fn get(&self, notification_id: &str) -> Result<Option<NotificationEntry>>;

    /// Newest first
    async fn list_for_entrant(&self, entrant_id: &str) -> Result<Vec<NotificationEntry>>;

    /// Newest first, across all events
    async fn list_all(&self, limit: usize) -> Result<Vec<NotificationEntry>>;

    async fn has_entry(&self, entrant_id: &str, event_id: &str, category: NotificationCategory) -> Result<bool>;

    async fn mark_read(&self, notification_id: &str) -> Result<NotificationEntry>;

    /// Also marks the entry read
    async fn record_response(
        &self,
        notification_id: &str,
        response: InvitationResponse,
        at: Timestamp,
    ) -> Result<NotificationEntry>;

    async fn delete_for_event(&self, event_id: &str) -> Result<u64>;
}

/// Usage counters for custom tags
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn increment(&self, tag: &str) -> Result<i64>;

    /// Never goes below zero
    async fn decrement(&self, tag: &str) -> Result<i64>;

    async fn custom_tags(&self) -> Result<Vec<Tag>>;
}

/// Moderation bans, one per (subject, kind)
#[async_trait]
pub trait BanList: Send + Sync {
    /// Returns false when the subject was already banned in that role
    async fn ban(&self, ban: Ban) -> Result<bool>;

    async fn is_banned(&self, subject_id: &str, kind: BanKind) -> Result<bool>;

    async fn list_bans(&self, kind: BanKind) -> Result<Vec<Ban>>;
}
