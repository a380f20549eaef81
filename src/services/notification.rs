//! Notification fan-out
//!
//! Sends one message to every entrant in a status bucket (or an explicit
//! list), records one log entry per recipient, and reports how many
//! deliveries succeeded. A failing recipient never stops the batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{LotteryConfig, MessagingConfig};
use crate::database::{LotteryStore, NotificationLog};
use crate::models::{Event, NotificationCategory, NotificationEntry, ParticipantStatus};
use crate::services::messaging::Messenger;
use crate::utils::clock::Clock;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::logging::log_fanout;

/// Per-call delivery counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutReport {
    pub notified: usize,
    pub failed: usize,
}

impl FanoutReport {
    pub fn total(&self) -> usize {
        self.notified + self.failed
    }

    /// Everything counted as failed; used when a batch could not start
    pub fn all_failed(count: usize) -> Self {
        Self { notified: 0, failed: count }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn LotteryStore>,
    log: Arc<dyn NotificationLog>,
    messenger: Arc<dyn Messenger>,
    clock: Arc<dyn Clock>,
    title: String,
    max_message_length: usize,
    max_concurrent_sends: usize,
}

impl NotificationService {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        log: Arc<dyn NotificationLog>,
        messenger: Arc<dyn Messenger>,
        clock: Arc<dyn Clock>,
        messaging: &MessagingConfig,
        lottery: &LotteryConfig,
    ) -> Self {
        Self {
            store,
            log,
            messenger,
            clock,
            title: messaging.notification_title.clone(),
            max_message_length: lottery.max_message_length,
            max_concurrent_sends: messaging.max_concurrent_sends.max(1),
        }
    }

    /// Trimmed message, or `InvalidInput` when blank or too long
    pub fn validate_message(&self, message: &str) -> Result<String> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(LotteryError::InvalidInput("Message must not be empty".to_string()));
        }
        let length = trimmed.chars().count();
        if length > self.max_message_length {
            return Err(LotteryError::InvalidInput(format!(
                "Message is {} characters; the limit is {}",
                length, self.max_message_length
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Broadcast to every entrant currently holding `bucket`
    pub async fn notify_bucket(&self, event_id: &str, bucket: ParticipantStatus, message: &str) -> Result<FanoutReport> {
        let message = self.validate_message(message)?;
        let category = NotificationCategory::for_bucket(bucket).ok_or_else(|| {
            LotteryError::InvalidInput(format!("Cannot notify the {} bucket", bucket))
        })?;
        let event = self.require_event(event_id).await?;

        let recipients: Vec<String> = self
            .store
            .get_entrant_statuses(event_id)
            .await?
            .into_iter()
            .filter(|row| row.status == bucket)
            .map(|row| row.entrant_id)
            .collect();

        let report = self.deliver_all(&event, recipients, category, &message).await;
        log_fanout(event_id, category.as_str(), report.notified, report.failed);
        Ok(report)
    }

    /// Send to an explicit list of entrants. With `skip_already_notified`,
    /// entrants that already have an entry of `category` for this event are
    /// left out.
    pub async fn notify_entrants(
        &self,
        event_id: &str,
        entrant_ids: &[String],
        category: NotificationCategory,
        message: &str,
        skip_already_notified: bool,
    ) -> Result<FanoutReport> {
        let message = self.validate_message(message)?;
        let event = self.require_event(event_id).await?;

        let mut seen = HashSet::new();
        let mut recipients = Vec::new();
        for entrant_id in entrant_ids {
            if !seen.insert(entrant_id.as_str()) {
                continue;
            }
            if skip_already_notified {
                match self.log.has_entry(entrant_id, event_id, category).await {
                    Ok(true) => {
                        debug!(event_id, entrant_id = %entrant_id, "Already notified, skipping");
                        continue;
                    }
                    Ok(false) => {}
                    // send anyway
                    Err(e) => warn!(event_id, entrant_id = %entrant_id, error = %e, "Dedupe check failed"),
                }
            }
            recipients.push(entrant_id.clone());
        }

        let report = self.deliver_all(&event, recipients, category, &message).await;
        log_fanout(event_id, category.as_str(), report.notified, report.failed);
        Ok(report)
    }

    /// Newest first
    pub async fn inbox(&self, entrant_id: &str) -> Result<Vec<NotificationEntry>> {
        self.log.list_for_entrant(entrant_id).await
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<NotificationEntry> {
        self.log.mark_read(notification_id).await
    }

    /// Admin view across all events
    pub async fn notification_log(&self, limit: usize) -> Result<Vec<NotificationEntry>> {
        self.log.list_all(limit).await
    }

    async fn require_event(&self, event_id: &str) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| LotteryError::EventNotFound { event_id: event_id.to_string() })
    }

    async fn deliver_all(
        &self,
        event: &Event,
        recipients: Vec<String>,
        category: NotificationCategory,
        message: &str,
    ) -> FanoutReport {
        if recipients.is_empty() {
            return FanoutReport::default();
        }

        let outcomes: Vec<bool> = stream::iter(recipients)
            .map(|entrant_id| async move { self.deliver_one(event, &entrant_id, category, message).await })
            .buffer_unordered(self.max_concurrent_sends)
            .collect()
            .await;

        let notified = outcomes.iter().filter(|ok| **ok).count();
        FanoutReport { notified, failed: outcomes.len() - notified }
    }

    /// Push, then log. Succeeds only when both legs do.
    async fn deliver_one(&self, event: &Event, entrant_id: &str, category: NotificationCategory, message: &str) -> bool {
        let mut data = HashMap::new();
        data.insert("eventId".to_string(), event.id.clone());
        data.insert("category".to_string(), category.as_str().to_string());

        let pushed = match self.messenger.send(entrant_id, &self.title, message, &data).await {
            Ok(()) => true,
            Err(e) => {
                warn!(event_id = %event.id, entrant_id, error = %e, "Push delivery failed");
                false
            }
        };

        let entry = NotificationEntry::new(&event.id, &event.name, entrant_id, message, category, self.clock.now(), pushed);
        let logged = match self.log.append(entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!(event_id = %event.id, entrant_id, error = %e, "Failed to record notification");
                false
            }
        };

        pushed && logged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::models::{EntrantStatus, EventStatus, Timestamp};
    use crate::services::messaging::RecordingMessenger;
    use crate::utils::clock::FixedClock;
    use assert_matches::assert_matches;

    async fn setup() -> (Arc<InMemoryStore>, Arc<RecordingMessenger>, NotificationService) {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_event(Event {
                id: "evt".to_string(),
                name: "Book club".to_string(),
                description: None,
                organizer_id: "org".to_string(),
                capacity: None,
                registration_open: Timestamp(0),
                registration_close: Timestamp(1_000),
                status: EventStatus::Open,
                tags: vec![],
                created_at: Timestamp(0),
            })
            .await
            .unwrap();
        let messenger = Arc::new(RecordingMessenger::new());
        let service = NotificationService::new(
            store.clone(),
            store.clone(),
            messenger.clone(),
            Arc::new(FixedClock::new(Timestamp(50))),
            &MessagingConfig::default(),
            &LotteryConfig::default(),
        );
        (store, messenger, service)
    }

    #[tokio::test]
    async fn test_message_validation() {
        let (_, _, service) = setup().await;
        assert_matches!(service.validate_message("   "), Err(LotteryError::InvalidInput(_)));
        assert_matches!(service.validate_message(&"x".repeat(501)), Err(LotteryError::InvalidInput(_)));
        assert_eq!(service.validate_message(&"é".repeat(500)).unwrap().chars().count(), 500);
        assert_eq!(service.validate_message("  hi  ").unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_empty_bucket() {
        let (_, messenger, service) = setup().await;
        let report = service.notify_bucket("evt", ParticipantStatus::Cancelled, "hello").await.unwrap();
        assert_eq!(report, FanoutReport { notified: 0, failed: 0 });
        assert!(messenger.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_declined_is_not_a_bucket() {
        let (_, _, service) = setup().await;
        assert_matches!(
            service.notify_bucket("evt", ParticipantStatus::Declined, "hello").await,
            Err(LotteryError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn test_unknown_event() {
        let (_, _, service) = setup().await;
        assert_matches!(
            service.notify_bucket("nope", ParticipantStatus::Waitlisted, "hello").await,
            Err(LotteryError::EventNotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_log_failure_counts_as_failed() {
        let (store, messenger, service) = setup().await;
        store.insert_entrant_if_absent(EntrantStatus::waitlisted("evt", "a", Timestamp(1))).await.unwrap();
        store.set_fail_on_append(true).await;

        let report = service.notify_bucket("evt", ParticipantStatus::Waitlisted, "hello").await.unwrap();
        assert_eq!(report, FanoutReport { notified: 0, failed: 1 });
        assert_eq!(messenger.sent_to("a").await, 1);
    }

    #[tokio::test]
    async fn test_notify_entrants_dedupes() {
        let (_, messenger, service) = setup().await;
        let ids = vec!["a".to_string(), "a".to_string(), "b".to_string()];

        let first = service.notify_entrants("evt", &ids, NotificationCategory::Winner, "won", true).await.unwrap();
        assert_eq!(first.notified, 2);

        let second = service.notify_entrants("evt", &ids, NotificationCategory::Winner, "won", true).await.unwrap();
        assert_eq!(second.total(), 0);
        assert_eq!(messenger.sent_to("a").await, 1);

        let data = &messenger.sent().await[0].data;
        assert_eq!(data.get("eventId").map(String::as_str), Some("evt"));
        assert_eq!(data.get("category").map(String::as_str), Some("winner"));
    }
}
