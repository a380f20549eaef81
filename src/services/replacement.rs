//! Replacement draws
//!
//! Picks one more entrant from the remaining waitlist after a spot frees up.
//! Which freed spot it fills is the organizer's concern.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::database::LotteryStore;
use crate::models::{Event, EventStatus};
use crate::services::lifecycle::{LifecycleMachine, TransitionOutcome};
use crate::services::lottery::LotterySelector;
use crate::services::waitlist::waitlisted;
use crate::utils::errors::{LotteryError, Result};

#[derive(Clone)]
pub struct ReplacementDrawer {
    store: Arc<dyn LotteryStore>,
    lifecycle: LifecycleMachine,
    selector: Arc<LotterySelector>,
    attempts: u32,
}

impl ReplacementDrawer {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        lifecycle: LifecycleMachine,
        selector: Arc<LotterySelector>,
        attempts: u32,
    ) -> Self {
        Self { store, lifecycle, selector, attempts: attempts.max(1) }
    }

    /// Invite one uniformly chosen waitlisted entrant and return their id.
    ///
    /// Fails with `EmptyPool` without touching anything when nobody is
    /// waiting. If every attempt loses a race to another writer, fails with
    /// `Conflict`.
    pub async fn draw_replacement(&self, event_id: &str) -> Result<String> {
        drawable_event(self.store.as_ref(), event_id).await?;

        let mut last_candidate = String::new();
        for attempt in 1..=self.attempts {
            let pool = waitlisted(self.store.get_entrant_statuses(event_id).await?);
            let Some(candidate) = self.selector.pick_one(&pool) else {
                return Err(LotteryError::EmptyPool { event_id: event_id.to_string() });
            };

            match self.lifecycle.invite(event_id, &candidate.entrant_id, true).await {
                Ok(TransitionOutcome::Applied(row)) => {
                    info!(event_id, entrant_id = %row.entrant_id, attempt, "Replacement invited");
                    return Ok(row.entrant_id);
                }
                Ok(TransitionOutcome::Unchanged(_)) => {
                    debug!(event_id, entrant_id = %candidate.entrant_id, attempt, "Candidate invited elsewhere, retrying");
                }
                Err(
                    e @ (LotteryError::Conflict { .. }
                    | LotteryError::IllegalTransition { .. }
                    | LotteryError::EntrantNotFound { .. }),
                ) => {
                    debug!(event_id, entrant_id = %candidate.entrant_id, attempt, error = %e, "Candidate changed, retrying");
                }
                Err(e) => return Err(e),
            }
            last_candidate = candidate.entrant_id;
        }

        warn!(event_id, attempts = self.attempts, "Replacement draw gave up after repeated conflicts");
        Err(LotteryError::Conflict { event_id: event_id.to_string(), entrant_id: last_candidate })
    }
}

/// The event, provided it exists and is not cancelled
pub(crate) async fn drawable_event(store: &dyn LotteryStore, event_id: &str) -> Result<Event> {
    let event = store
        .get_event(event_id)
        .await?
        .ok_or_else(|| LotteryError::EventNotFound { event_id: event_id.to_string() })?;
    if event.status == EventStatus::Cancelled {
        return Err(LotteryError::InvalidInput(format!("Event {} is cancelled", event_id)));
    }
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::models::{EntrantStatus, ParticipantStatus, Timestamp};
    use crate::utils::clock::FixedClock;
    use assert_matches::assert_matches;

    async fn setup(waiting: &[&str]) -> (Arc<InMemoryStore>, ReplacementDrawer) {
        let store = Arc::new(InMemoryStore::new());
        store
            .create_event(Event {
                id: "evt".to_string(),
                name: "Run club".to_string(),
                description: None,
                organizer_id: "org".to_string(),
                capacity: Some(1),
                registration_open: Timestamp(0),
                registration_close: Timestamp(1_000),
                status: EventStatus::Open,
                tags: vec![],
                created_at: Timestamp(0),
            })
            .await
            .unwrap();
        for (i, id) in waiting.iter().enumerate() {
            store.insert_entrant_if_absent(EntrantStatus::waitlisted("evt", id, Timestamp(i as i64))).await.unwrap();
        }
        let lifecycle = LifecycleMachine::new(store.clone(), Arc::new(FixedClock::new(Timestamp(10))));
        let drawer = ReplacementDrawer::new(store.clone(), lifecycle, Arc::new(LotterySelector::seeded(5)), 3);
        (store, drawer)
    }

    #[tokio::test]
    async fn test_replacement_is_flagged() {
        let (store, drawer) = setup(&["a"]).await;
        let id = drawer.draw_replacement("evt").await.unwrap();
        assert_eq!(id, "a");
        let row = store.get_entrant_status("evt", "a").await.unwrap().unwrap();
        assert_eq!(row.status, ParticipantStatus::Invited);
        assert!(row.is_replacement);
        assert_eq!(row.invited_at, Some(Timestamp(10)));
    }

    #[tokio::test]
    async fn test_empty_pool() {
        let (store, drawer) = setup(&[]).await;
        assert_matches!(drawer.draw_replacement("evt").await, Err(LotteryError::EmptyPool { .. }));
        assert_eq!(store.entrant_count("evt").await, 0);
    }

    #[tokio::test]
    async fn test_unknown_event() {
        let (_, drawer) = setup(&["a"]).await;
        assert_matches!(drawer.draw_replacement("other").await, Err(LotteryError::EventNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_event_draws_nobody() {
        let (store, drawer) = setup(&["a", "b"]).await;
        let mut event = store.get_event("evt").await.unwrap().unwrap();
        event.status = EventStatus::Cancelled;
        store.update_event(&event).await.unwrap();

        assert_matches!(drawer.draw_replacement("evt").await, Err(LotteryError::InvalidInput(_)));
        let rows = store.get_entrant_statuses("evt").await.unwrap();
        assert!(rows.iter().all(|r| r.status == ParticipantStatus::Waitlisted));
    }
}
