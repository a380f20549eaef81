//! Database service layer
//!
//! Bundles the Postgres repositories and exposes them through the storage
//! traits the engine consumes.

use std::time::Instant;

use async_trait::async_trait;

use crate::database::store::{BanList, CasOutcome, InsertOutcome, LotteryStore, NotificationLog, TagStore};
use crate::database::{BanRepository, DatabasePool, EntrantRepository, EventRepository, NotificationRepository, TagRepository};
use crate::models::{
    Ban, BanKind, EntrantStatus, Event, InvitationResponse, NotificationCategory, NotificationEntry,
    ParticipantStatus, StatusTimestamps, Tag, Timestamp,
};
use crate::models::tag::is_predefined;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::logging::log_database_operation;

const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub entrants: EntrantRepository,
    pub notifications: NotificationRepository,
    pub tags: TagRepository,
    pub bans: BanRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            entrants: EntrantRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            tags: TagRepository::new(pool.clone()),
            bans: BanRepository::new(pool),
        }
    }

    async fn current_status(&self, event_id: &str, entrant_id: &str) -> Result<Option<ParticipantStatus>> {
        Ok(self.entrants.find(event_id, entrant_id).await?.map(|row| row.status))
    }
}

fn is_foreign_key_violation(err: &LotteryError) -> bool {
    match err {
        LotteryError::Database(sqlx::Error::Database(db)) => db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION),
        _ => false,
    }
}

#[async_trait]
impl LotteryStore for DatabaseService {
    async fn create_event(&self, event: Event) -> Result<Event> {
        self.events.create(&event).await
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        self.events.find_by_id(event_id).await
    }

    async fn event_exists(&self, event_id: &str) -> Result<bool> {
        self.events.exists(event_id).await
    }

    async fn events_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>> {
        self.events.list_by_organizer(organizer_id).await
    }

    async fn update_event(&self, event: &Event) -> Result<Event> {
        self.events
            .update(event)
            .await?
            .ok_or_else(|| LotteryError::EventNotFound { event_id: event.id.clone() })
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool> {
        self.events.delete(event_id).await
    }

    async fn get_entrant_statuses(&self, event_id: &str) -> Result<Vec<EntrantStatus>> {
        self.entrants.list_for_event(event_id).await
    }

    async fn get_entrant_status(&self, event_id: &str, entrant_id: &str) -> Result<Option<EntrantStatus>> {
        self.entrants.find(event_id, entrant_id).await
    }

    async fn get_entrant_history(&self, entrant_id: &str) -> Result<Vec<EntrantStatus>> {
        self.entrants.history(entrant_id).await
    }

    async fn insert_entrant_if_absent(&self, row: EntrantStatus) -> Result<InsertOutcome> {
        match self.entrants.insert_if_absent(&row).await {
            Ok(Some(inserted)) => Ok(InsertOutcome::Inserted(inserted)),
            Ok(None) => {
                let existing = self
                    .entrants
                    .find(&row.event_id, &row.entrant_id)
                    .await?
                    .ok_or_else(|| LotteryError::Conflict {
                        event_id: row.event_id.clone(),
                        entrant_id: row.entrant_id.clone(),
                    })?;
                Ok(InsertOutcome::Existing(existing))
            }
            Err(e) if is_foreign_key_violation(&e) => Err(LotteryError::EventNotFound { event_id: row.event_id }),
            Err(e) => Err(e),
        }
    }

    async fn delete_entrant_if_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: ParticipantStatus,
    ) -> Result<CasOutcome> {
        match self.entrants.delete_if_status(event_id, entrant_id, expected).await? {
            Some(row) => Ok(CasOutcome::Applied(row)),
            None => Ok(CasOutcome::Conflict { actual: self.current_status(event_id, entrant_id).await? }),
        }
    }

    async fn compare_and_set_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: Option<ParticipantStatus>,
        new: ParticipantStatus,
        stamps: StatusTimestamps,
    ) -> Result<CasOutcome> {
        let started = Instant::now();
        let result = self.entrants.compare_and_set(event_id, entrant_id, expected, new, &stamps).await;
        log_database_operation("compare_and_set", "entrant_statuses", started.elapsed().as_millis() as u64, result.is_ok());

        match result? {
            Some(row) => Ok(CasOutcome::Applied(row)),
            None => Ok(CasOutcome::Conflict { actual: self.current_status(event_id, entrant_id).await? }),
        }
    }
}

#[async_trait]
impl NotificationLog for DatabaseService {
    async fn append(&self, entry: NotificationEntry) -> Result<()> {
        self.notifications.insert(&entry).await
    }

    async fn get(&self, notification_id: &str) -> Result<Option<NotificationEntry>> {
        self.notifications.find_by_id(notification_id).await
    }

    async fn list_for_entrant(&self, entrant_id: &str) -> Result<Vec<NotificationEntry>> {
        self.notifications.list_for_entrant(entrant_id).await
    }

    async fn list_all(&self, limit: usize) -> Result<Vec<NotificationEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.notifications.list_all(limit).await
    }

    async fn has_entry(&self, entrant_id: &str, event_id: &str, category: NotificationCategory) -> Result<bool> {
        self.notifications.exists(entrant_id, event_id, category).await
    }

    async fn mark_read(&self, notification_id: &str) -> Result<NotificationEntry> {
        self.notifications
            .mark_read(notification_id)
            .await?
            .ok_or_else(|| LotteryError::NotificationNotFound { notification_id: notification_id.to_string() })
    }

    async fn record_response(
        &self,
        notification_id: &str,
        response: InvitationResponse,
        at: Timestamp,
    ) -> Result<NotificationEntry> {
        self.notifications
            .record_response(notification_id, response, at)
            .await?
            .ok_or_else(|| LotteryError::NotificationNotFound { notification_id: notification_id.to_string() })
    }

    async fn delete_for_event(&self, event_id: &str) -> Result<u64> {
        self.notifications.delete_for_event(event_id).await
    }
}

#[async_trait]
impl TagStore for DatabaseService {
    async fn increment(&self, tag: &str) -> Result<i64> {
        if is_predefined(tag) {
            return Ok(0);
        }
        self.tags.increment(tag).await
    }

    async fn decrement(&self, tag: &str) -> Result<i64> {
        if is_predefined(tag) {
            return Ok(0);
        }
        self.tags.decrement(tag).await
    }

    async fn custom_tags(&self) -> Result<Vec<Tag>> {
        self.tags.list().await
    }
}

#[async_trait]
impl BanList for DatabaseService {
    async fn ban(&self, ban: Ban) -> Result<bool> {
        self.bans.insert(&ban).await
    }

    async fn is_banned(&self, subject_id: &str, kind: BanKind) -> Result<bool> {
        self.bans.exists(subject_id, kind).await
    }

    async fn list_bans(&self, kind: BanKind) -> Result<Vec<Ban>> {
        self.bans.list(kind).await
    }
}
