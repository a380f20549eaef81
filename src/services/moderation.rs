//! Administrator moderation
//!
//! Removing an entrant strips every registration they hold and bans them
//! from joining again. Banning an organizer deletes all of their events,
//! with the same cascade as a normal delete, and stops new ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::database::{BanList, CasOutcome, LotteryStore};
use crate::models::{Ban, BanKind, ParticipantStatus};
use crate::services::events::EventService;
use crate::utils::clock::Clock;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::helpers::require_id;

/// A row may change status under us a few times before it is gone
const DELETE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerBanReport {
    pub events_deleted: Vec<String>,
    /// Events that could not be deleted; the ban still holds
    pub events_failed: Vec<String>,
    /// False when the organizer was already banned
    pub newly_banned: bool,
}

#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn LotteryStore>,
    bans: Arc<dyn BanList>,
    events: EventService,
    clock: Arc<dyn Clock>,
}

impl ModerationService {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        bans: Arc<dyn BanList>,
        events: EventService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, bans, events, clock }
    }

    /// Ban the entrant and delete every participation row they hold.
    /// Returns the ids of the events they were removed from.
    pub async fn remove_entrant(&self, entrant_id: &str, admin_id: &str) -> Result<Vec<String>> {
        require_id("Entrant id", entrant_id)?;
        require_id("Admin id", admin_id)?;
        self.events.ensure_admin(admin_id)?;

        // ban first so a join racing the cleanup cannot slip back in
        self.ban(entrant_id, BanKind::Entrant, admin_id).await?;

        let mut removed = Vec::new();
        for row in self.store.get_entrant_history(entrant_id).await? {
            if self.delete_row(&row.event_id, entrant_id, row.status).await? {
                removed.push(row.event_id);
            }
        }

        info!(entrant_id, admin_id, events = removed.len(), "Entrant removed and banned");
        Ok(removed)
    }

    /// Ban the organizer and delete all of their events
    pub async fn ban_organizer(&self, organizer_id: &str, admin_id: &str) -> Result<OrganizerBanReport> {
        require_id("Organizer id", organizer_id)?;
        require_id("Admin id", admin_id)?;
        self.events.ensure_admin(admin_id)?;

        let mut report = OrganizerBanReport {
            newly_banned: self.ban(organizer_id, BanKind::Organizer, admin_id).await?,
            ..OrganizerBanReport::default()
        };

        for event in self.store.events_by_organizer(organizer_id).await? {
            match self.events.delete_event(&event.id, admin_id).await {
                Ok(()) => report.events_deleted.push(event.id),
                Err(LotteryError::EventNotFound { .. }) => {
                    debug!(event_id = %event.id, "Event already gone");
                }
                Err(e) => {
                    warn!(event_id = %event.id, organizer_id, error = %e, "Failed to delete event of banned organizer");
                    report.events_failed.push(event.id);
                }
            }
        }

        info!(
            organizer_id,
            admin_id,
            deleted = report.events_deleted.len(),
            failed = report.events_failed.len(),
            "Organizer banned"
        );
        Ok(report)
    }

    pub async fn is_banned(&self, subject_id: &str, kind: BanKind) -> Result<bool> {
        self.bans.is_banned(subject_id, kind).await
    }

    pub async fn banned(&self, kind: BanKind, admin_id: &str) -> Result<Vec<Ban>> {
        self.events.ensure_admin(admin_id)?;
        self.bans.list_bans(kind).await
    }

    async fn ban(&self, subject_id: &str, kind: BanKind, admin_id: &str) -> Result<bool> {
        self.bans
            .ban(Ban {
                subject_id: subject_id.to_string(),
                kind,
                banned_by: admin_id.to_string(),
                banned_at: self.clock.now(),
            })
            .await
    }

    /// Delete whatever status the row holds, following concurrent changes
    async fn delete_row(&self, event_id: &str, entrant_id: &str, mut expected: ParticipantStatus) -> Result<bool> {
        for _ in 0..DELETE_ATTEMPTS {
            match self.store.delete_entrant_if_status(event_id, entrant_id, expected).await? {
                CasOutcome::Applied(_) => return Ok(true),
                CasOutcome::Conflict { actual: None } => return Ok(false),
                CasOutcome::Conflict { actual: Some(actual) } => expected = actual,
            }
        }
        Err(LotteryError::Conflict { event_id: event_id.to_string(), entrant_id: entrant_id.to_string() })
    }
}
