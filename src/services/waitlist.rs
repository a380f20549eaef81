//! Waitlist pool service
//!
//! Join and leave an event's waitlist, and read the live pool.

use std::sync::Arc;

use tracing::{debug, info};

use crate::database::{BanList, CasOutcome, InsertOutcome, LotteryStore};
use crate::models::{BanKind, EntrantStatus, Event, ParticipantStatus, Timestamp};
use crate::utils::errors::{LotteryError, Result};
use crate::utils::helpers::require_id;
use crate::utils::logging::log_entrant_action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined(EntrantStatus),
    /// The entrant was already waiting; nothing changed
    AlreadyWaitlisted(EntrantStatus),
}

impl JoinOutcome {
    pub fn row(&self) -> &EntrantStatus {
        match self {
            JoinOutcome::Joined(row) | JoinOutcome::AlreadyWaitlisted(row) => row,
        }
    }
}

#[derive(Clone)]
pub struct WaitlistPool {
    store: Arc<dyn LotteryStore>,
    bans: Arc<dyn BanList>,
}

impl WaitlistPool {
    pub fn new(store: Arc<dyn LotteryStore>, bans: Arc<dyn BanList>) -> Self {
        Self { store, bans }
    }

    pub(crate) async fn require_event(&self, event_id: &str) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| LotteryError::EventNotFound { event_id: event_id.to_string() })
    }

    /// Add the entrant to the waitlist
    pub async fn join(&self, event_id: &str, entrant_id: &str, now: Timestamp) -> Result<JoinOutcome> {
        require_id("Event id", event_id)?;
        require_id("Entrant id", entrant_id)?;

        let event = self.require_event(event_id).await?;
        if event.is_organizer(entrant_id) {
            return Err(LotteryError::PermissionDenied(
                "Organizers cannot join their own event".to_string(),
            ));
        }
        if self.bans.is_banned(entrant_id, BanKind::Entrant).await? {
            return Err(LotteryError::PermissionDenied(
                "You are banned from joining events".to_string(),
            ));
        }

        if let Some(existing) = self.store.get_entrant_status(event_id, entrant_id).await? {
            return existing_outcome(existing);
        }

        if !event.is_registration_open(now) {
            return Err(LotteryError::RegistrationClosed {
                event_id: event_id.to_string(),
                reason: "Registration is not open".to_string(),
            });
        }

        let rows = self.store.get_entrant_statuses(event_id).await?;
        let enrolled = rows.iter().filter(|r| r.status == ParticipantStatus::Enrolled).count();
        if !event.has_capacity(enrolled) {
            return Err(LotteryError::RegistrationClosed {
                event_id: event_id.to_string(),
                reason: "Event is full".to_string(),
            });
        }

        match self.store.insert_entrant_if_absent(EntrantStatus::waitlisted(event_id, entrant_id, now)).await? {
            InsertOutcome::Inserted(row) => {
                log_entrant_action(event_id, entrant_id, "join", None);
                Ok(JoinOutcome::Joined(row))
            }
            // lost a race with another join for the same key
            InsertOutcome::Existing(existing) => existing_outcome(existing),
        }
    }

    /// Remove a waitlisted entrant
    pub async fn leave(&self, event_id: &str, entrant_id: &str) -> Result<EntrantStatus> {
        match self
            .store
            .delete_entrant_if_status(event_id, entrant_id, ParticipantStatus::Waitlisted)
            .await?
        {
            CasOutcome::Applied(row) => {
                log_entrant_action(event_id, entrant_id, "leave", None);
                Ok(row)
            }
            CasOutcome::Conflict { actual } => {
                debug!(event_id, entrant_id, actual = ?actual, "Leave rejected");
                Err(LotteryError::NotInWaitlist {
                    event_id: event_id.to_string(),
                    entrant_id: entrant_id.to_string(),
                })
            }
        }
    }

    /// Live pool in draw order
    pub async fn list(&self, event_id: &str) -> Result<Vec<EntrantStatus>> {
        if !self.store.event_exists(event_id).await? {
            return Err(LotteryError::EventNotFound { event_id: event_id.to_string() });
        }
        Ok(waitlisted(self.store.get_entrant_statuses(event_id).await?))
    }

    pub async fn count(&self, event_id: &str) -> Result<usize> {
        Ok(self.list(event_id).await?.len())
    }

    /// Every event the entrant has registered for, newest request first
    pub async fn history(&self, entrant_id: &str) -> Result<Vec<EntrantStatus>> {
        let rows = self.store.get_entrant_history(entrant_id).await?;
        info!(entrant_id, count = rows.len(), "Loaded registration history");
        Ok(rows)
    }
}

/// WAITLISTED rows of a snapshot, sorted into pool order
pub fn waitlisted(rows: Vec<EntrantStatus>) -> Vec<EntrantStatus> {
    let mut pool: Vec<EntrantStatus> = rows
        .into_iter()
        .filter(|r| r.status == ParticipantStatus::Waitlisted)
        .collect();
    pool.sort_by(EntrantStatus::pool_order);
    pool
}

fn existing_outcome(existing: EntrantStatus) -> Result<JoinOutcome> {
    if existing.status == ParticipantStatus::Waitlisted {
        Ok(JoinOutcome::AlreadyWaitlisted(existing))
    } else {
        Err(LotteryError::AlreadyJoined {
            event_id: existing.event_id,
            entrant_id: existing.entrant_id,
            status: existing.status,
        })
    }
}
