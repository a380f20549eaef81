//! In-memory storage backend
//!
//! Implements every storage trait over a single `RwLock`, so each
//! compare-and-set runs under one write guard. Used by tests and by
//! embedders that do not run Postgres.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{BanList, CasOutcome, InsertOutcome, LotteryStore, NotificationLog, TagStore};
use crate::models::{
    Ban, BanKind, EntrantStatus, Event, InvitationResponse, NotificationCategory, NotificationEntry,
    ParticipantStatus, StatusTimestamps, Tag, Timestamp,
};
use crate::models::tag::is_predefined;
use crate::utils::errors::{LotteryError, Result};

#[derive(Default)]
struct MemoryState {
    events: HashMap<String, Event>,
    entrants: BTreeMap<(String, String), EntrantStatus>,
    notifications: Vec<NotificationEntry>,
    tags: BTreeMap<String, i64>,
    bans: BTreeMap<(String, BanKind), Ban>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
    fail_on_append: RwLock<bool>,
    fail_on_response: RwLock<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every notification append fail
    pub async fn set_fail_on_append(&self, fail: bool) {
        *self.fail_on_append.write().await = fail;
    }

    /// Make every `record_response` fail
    pub async fn set_fail_on_response(&self, fail: bool) {
        *self.fail_on_response.write().await = fail;
    }

    pub async fn notification_count(&self) -> usize {
        self.state.read().await.notifications.len()
    }

    pub async fn entrant_count(&self, event_id: &str) -> usize {
        self.state
            .read()
            .await
            .entrants
            .keys()
            .filter(|(event, _)| event == event_id)
            .count()
    }
}

fn key(event_id: &str, entrant_id: &str) -> (String, String) {
    (event_id.to_string(), entrant_id.to_string())
}

fn newest_first(a: &NotificationEntry, b: &NotificationEntry) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl LotteryStore for InMemoryStore {
    async fn create_event(&self, event: Event) -> Result<Event> {
        let mut state = self.state.write().await;
        if state.events.contains_key(&event.id) {
            return Err(LotteryError::InvalidInput(format!("Event {} already exists", event.id)));
        }
        state.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>> {
        Ok(self.state.read().await.events.get(event_id).cloned())
    }

    async fn event_exists(&self, event_id: &str) -> Result<bool> {
        Ok(self.state.read().await.events.contains_key(event_id))
    }

    async fn events_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self
            .state
            .read()
            .await
            .events
            .values()
            .filter(|e| e.organizer_id == organizer_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn update_event(&self, event: &Event) -> Result<Event> {
        let mut state = self.state.write().await;
        match state.events.get_mut(&event.id) {
            Some(stored) => {
                let created_at = stored.created_at;
                *stored = Event { created_at, ..event.clone() };
                Ok(stored.clone())
            }
            None => Err(LotteryError::EventNotFound { event_id: event.id.clone() }),
        }
    }

    async fn delete_event(&self, event_id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.events.remove(event_id).is_some();
        state.entrants.retain(|(event, _), _| event != event_id);
        Ok(existed)
    }

    async fn get_entrant_statuses(&self, event_id: &str) -> Result<Vec<EntrantStatus>> {
        Ok(self
            .state
            .read()
            .await
            .entrants
            .iter()
            .filter(|((event, _), _)| event == event_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn get_entrant_status(&self, event_id: &str, entrant_id: &str) -> Result<Option<EntrantStatus>> {
        Ok(self.state.read().await.entrants.get(&key(event_id, entrant_id)).cloned())
    }

    async fn get_entrant_history(&self, entrant_id: &str) -> Result<Vec<EntrantStatus>> {
        let mut rows: Vec<EntrantStatus> = self
            .state
            .read()
            .await
            .entrants
            .values()
            .filter(|row| row.entrant_id == entrant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.request_time.cmp(&a.request_time).then_with(|| a.event_id.cmp(&b.event_id)));
        Ok(rows)
    }

    async fn insert_entrant_if_absent(&self, row: EntrantStatus) -> Result<InsertOutcome> {
        let mut state = self.state.write().await;
        if !state.events.contains_key(&row.event_id) {
            return Err(LotteryError::EventNotFound { event_id: row.event_id });
        }
        let k = key(&row.event_id, &row.entrant_id);
        if let Some(existing) = state.entrants.get(&k) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        state.entrants.insert(k, row.clone());
        Ok(InsertOutcome::Inserted(row))
    }

    async fn delete_entrant_if_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: ParticipantStatus,
    ) -> Result<CasOutcome> {
        let mut state = self.state.write().await;
        let k = key(event_id, entrant_id);
        match state.entrants.get(&k).map(|row| row.status) {
            Some(actual) if actual == expected => match state.entrants.remove(&k) {
                Some(row) => Ok(CasOutcome::Applied(row)),
                None => Ok(CasOutcome::Conflict { actual: None }),
            },
            actual => Ok(CasOutcome::Conflict { actual }),
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
        let mut state = self.state.write().await;
        let Some(row) = state.entrants.get_mut(&key(event_id, entrant_id)) else {
            return Ok(CasOutcome::Conflict { actual: None });
        };
        if let Some(expected) = expected {
            if row.status != expected {
                return Ok(CasOutcome::Conflict { actual: Some(row.status) });
            }
        }
        *row = row.apply(new, &stamps);
        Ok(CasOutcome::Applied(row.clone()))
    }
}

#[async_trait]
impl NotificationLog for InMemoryStore {
    async fn append(&self, entry: NotificationEntry) -> Result<()> {
        if *self.fail_on_append.read().await {
            return Err(LotteryError::Messaging("Notification log unavailable".to_string()));
        }
        self.state.write().await.notifications.push(entry);
        Ok(())
    }

    async fn get(&self, notification_id: &str) -> Result<Option<NotificationEntry>> {
        Ok(self
            .state
            .read()
            .await
            .notifications
            .iter()
            .find(|n| n.id == notification_id)
            .cloned())
    }

    async fn list_for_entrant(&self, entrant_id: &str) -> Result<Vec<NotificationEntry>> {
        let mut entries: Vec<NotificationEntry> = self
            .state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.entrant_id == entrant_id)
            .cloned()
            .collect();
        entries.sort_by(newest_first);
        Ok(entries)
    }

    async fn list_all(&self, limit: usize) -> Result<Vec<NotificationEntry>> {
        let mut entries = self.state.read().await.notifications.clone();
        entries.sort_by(newest_first);
        entries.truncate(limit);
        Ok(entries)
    }

    async fn has_entry(&self, entrant_id: &str, event_id: &str, category: NotificationCategory) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .notifications
            .iter()
            .any(|n| n.entrant_id == entrant_id && n.event_id == event_id && n.category == category))
    }

    async fn mark_read(&self, notification_id: &str) -> Result<NotificationEntry> {
        let mut state = self.state.write().await;
        let entry = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| LotteryError::NotificationNotFound { notification_id: notification_id.to_string() })?;
        entry.read = true;
        Ok(entry.clone())
    }

    async fn record_response(
        &self,
        notification_id: &str,
        response: InvitationResponse,
        at: Timestamp,
    ) -> Result<NotificationEntry> {
        if *self.fail_on_response.read().await {
            return Err(LotteryError::Messaging("Notification log unavailable".to_string()));
        }
        let mut state = self.state.write().await;
        let entry = state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| LotteryError::NotificationNotFound { notification_id: notification_id.to_string() })?;
        entry.read = true;
        entry.response = Some(response);
        entry.responded_at = Some(at);
        Ok(entry.clone())
    }

    async fn delete_for_event(&self, event_id: &str) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.event_id != event_id);
        Ok((before - state.notifications.len()) as u64)
    }
}

#[async_trait]
impl TagStore for InMemoryStore {
    async fn increment(&self, tag: &str) -> Result<i64> {
        if is_predefined(tag) {
            return Ok(0);
        }
        let mut state = self.state.write().await;
        let count = state.tags.entry(tag.to_string()).or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn decrement(&self, tag: &str) -> Result<i64> {
        if is_predefined(tag) {
            return Ok(0);
        }
        let mut state = self.state.write().await;
        match state.tags.get_mut(tag) {
            Some(count) => {
                *count = (*count - 1).max(0);
                Ok(*count)
            }
            None => Ok(0),
        }
    }

    async fn custom_tags(&self) -> Result<Vec<Tag>> {
        Ok(self
            .state
            .read()
            .await
            .tags
            .iter()
            .map(|(name, usage_count)| Tag { name: name.clone(), usage_count: *usage_count })
            .collect())
    }
}

#[async_trait]
impl BanList for InMemoryStore {
    async fn ban(&self, ban: Ban) -> Result<bool> {
        let mut state = self.state.write().await;
        let k = (ban.subject_id.clone(), ban.kind);
        if state.bans.contains_key(&k) {
            return Ok(false);
        }
        state.bans.insert(k, ban);
        Ok(true)
    }

    async fn is_banned(&self, subject_id: &str, kind: BanKind) -> Result<bool> {
        Ok(self.state.read().await.bans.contains_key(&(subject_id.to_string(), kind)))
    }

    async fn list_bans(&self, kind: BanKind) -> Result<Vec<Ban>> {
        Ok(self
            .state
            .read()
            .await
            .bans
            .values()
            .filter(|b| b.kind == kind)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            name: "Pottery".to_string(),
            description: None,
            organizer_id: "org".to_string(),
            capacity: None,
            registration_open: Timestamp(0),
            registration_close: Timestamp(1_000),
            status: EventStatus::Open,
            tags: vec![],
            created_at: Timestamp(0),
        }
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let store = InMemoryStore::new();
        store.create_event(event("e1")).await.unwrap();

        let first = store.insert_entrant_if_absent(EntrantStatus::waitlisted("e1", "a", Timestamp(1))).await.unwrap();
        let second = store.insert_entrant_if_absent(EntrantStatus::waitlisted("e1", "a", Timestamp(2))).await.unwrap();

        assert!(matches!(first, InsertOutcome::Inserted(_)));
        match second {
            InsertOutcome::Existing(row) => assert_eq!(row.request_time, Timestamp(1)),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.entrant_count("e1").await, 1);
    }

    #[tokio::test]
    async fn test_cas_rejects_stale_expectation() {
        let store = InMemoryStore::new();
        store.create_event(event("e1")).await.unwrap();
        store.insert_entrant_if_absent(EntrantStatus::waitlisted("e1", "a", Timestamp(1))).await.unwrap();

        let stamps = StatusTimestamps::invited(Timestamp(5), false);
        let applied = store
            .compare_and_set_status("e1", "a", Some(ParticipantStatus::Waitlisted), ParticipantStatus::Invited, stamps)
            .await
            .unwrap();
        assert!(matches!(applied, CasOutcome::Applied(_)));

        let stale = store
            .compare_and_set_status("e1", "a", Some(ParticipantStatus::Waitlisted), ParticipantStatus::Invited, stamps)
            .await
            .unwrap();
        assert_eq!(stale, CasOutcome::Conflict { actual: Some(ParticipantStatus::Invited) });

        let missing = store
            .compare_and_set_status("e1", "zz", None, ParticipantStatus::Invited, stamps)
            .await
            .unwrap();
        assert_eq!(missing, CasOutcome::Conflict { actual: None });
    }

    #[tokio::test]
    async fn test_delete_event_cascades_rows() {
        let store = InMemoryStore::new();
        store.create_event(event("e1")).await.unwrap();
        store.create_event(event("e2")).await.unwrap();
        store.insert_entrant_if_absent(EntrantStatus::waitlisted("e1", "a", Timestamp(1))).await.unwrap();
        store.insert_entrant_if_absent(EntrantStatus::waitlisted("e2", "a", Timestamp(1))).await.unwrap();

        assert!(store.delete_event("e1").await.unwrap());
        assert_eq!(store.entrant_count("e1").await, 0);
        assert_eq!(store.entrant_count("e2").await, 1);
        assert!(!store.delete_event("e1").await.unwrap());
    }

    #[tokio::test]
    async fn test_tag_counter_floors_at_zero() {
        let store = InMemoryStore::new();
        assert_eq!(store.increment("chess").await.unwrap(), 1);
        assert_eq!(store.decrement("chess").await.unwrap(), 0);
        assert_eq!(store.decrement("chess").await.unwrap(), 0);
        assert_eq!(store.increment("music").await.unwrap(), 0);
        let tags = store.custom_tags().await.unwrap();
        assert_eq!(tags, vec![Tag { name: "chess".to_string(), usage_count: 0 }]);
    }

    #[tokio::test]
    async fn test_append_failure_injection() {
        let store = InMemoryStore::new();
        store.set_fail_on_append(true).await;
        let entry = NotificationEntry::new("e1", "Pottery", "a", "hi", NotificationCategory::Waitlist, Timestamp(1), true);
        assert!(store.append(entry).await.is_err());
        assert_eq!(store.notification_count().await, 0);
    }

    #[tokio::test]
    async fn test_ban_is_recorded_once_per_kind() {
        let store = InMemoryStore::new();
        let ban = Ban {
            subject_id: "a".to_string(),
            kind: BanKind::Entrant,
            banned_by: "admin".to_string(),
            banned_at: Timestamp(1),
        };
        assert!(store.ban(ban.clone()).await.unwrap());
        assert!(!store.ban(ban).await.unwrap());
        assert!(store.is_banned("a", BanKind::Entrant).await.unwrap());
        assert!(!store.is_banned("a", BanKind::Organizer).await.unwrap());
        assert_eq!(store.list_bans(BanKind::Entrant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_events_by_organizer_newest_first() {
        let store = InMemoryStore::new();
        store.create_event(event("e1")).await.unwrap();
        store.create_event(Event { created_at: Timestamp(5), ..event("e2") }).await.unwrap();
        store.create_event(Event { organizer_id: "other".to_string(), ..event("e3") }).await.unwrap();

        let ids: Vec<_> = store.events_by_organizer("org").await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["e2".to_string(), "e1".to_string()]);
    }
}
