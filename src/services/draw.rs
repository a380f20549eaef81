//! Draw orchestration
//!
//! Runs an organizer's lottery end to end: validate, size the draw against
//! capacity, select, commit each invitation with its own compare-and-set,
//! then send the winner invitations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::database::LotteryStore;
use crate::models::{NotificationCategory, ParticipantStatus};
use crate::services::lifecycle::{LifecycleMachine, TransitionOutcome};
use crate::services::lottery::LotterySelector;
use crate::services::notification::{FanoutReport, NotificationService};
use crate::services::replacement::{drawable_event, ReplacementDrawer};
use crate::services::waitlist::waitlisted;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::logging::log_draw;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawReport {
    pub requested: usize,
    /// Entrants moved to INVITED by this draw
    pub invited: Vec<String>,
    /// Winners requested but not drawn, from a small pool or a full event
    pub shortfall: usize,
    /// Selected entrants whose row changed before the invite landed
    pub skipped: Vec<String>,
    pub notifications: FanoutReport,
}

#[derive(Clone)]
pub struct DrawService {
    store: Arc<dyn LotteryStore>,
    lifecycle: LifecycleMachine,
    selector: Arc<LotterySelector>,
    replacement: ReplacementDrawer,
    notifications: NotificationService,
    winner_message: String,
}

impl DrawService {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        lifecycle: LifecycleMachine,
        selector: Arc<LotterySelector>,
        replacement: ReplacementDrawer,
        notifications: NotificationService,
        winner_message: String,
    ) -> Self {
        Self { store, lifecycle, selector, replacement, notifications, winner_message }
    }

    /// Draw up to `count` winners for the event and invite them
    pub async fn run_draw(&self, event_id: &str, count: usize) -> Result<DrawReport> {
        if count == 0 {
            return Err(LotteryError::InvalidInput("Number of winners must be greater than 0".to_string()));
        }

        let event = drawable_event(self.store.as_ref(), event_id).await?;

        let rows = self.store.get_entrant_statuses(event_id).await?;
        let enrolled = rows.iter().filter(|r| r.status == ParticipantStatus::Enrolled).count();
        let pending = rows.iter().filter(|r| r.status == ParticipantStatus::Invited).count();
        let pool = waitlisted(rows);
        if pool.is_empty() {
            return Err(LotteryError::EmptyPool { event_id: event_id.to_string() });
        }

        let size = event
            .open_slots(enrolled, pending)
            .map_or(count, |slots| count.min(slots));
        let draw = self.selector.draw(&pool, size);

        let mut report = DrawReport {
            requested: count,
            shortfall: count - draw.selected.len(),
            ..DrawReport::default()
        };

        for row in draw.selected {
            match self.lifecycle.invite(event_id, &row.entrant_id, false).await {
                Ok(TransitionOutcome::Applied(_)) => report.invited.push(row.entrant_id),
                Ok(TransitionOutcome::Unchanged(_)) => report.skipped.push(row.entrant_id),
                Err(e) => {
                    warn!(event_id, entrant_id = %row.entrant_id, error = %e, "Invite not committed");
                    report.skipped.push(row.entrant_id);
                }
            }
        }

        if !report.invited.is_empty() {
            report.notifications = match self
                .notifications
                .notify_entrants(event_id, &report.invited, NotificationCategory::Winner, &self.winner_message, true)
                .await
            {
                Ok(fanout) => fanout,
                Err(e) => {
                    warn!(event_id, error = %e, "Winner notifications not sent");
                    FanoutReport::all_failed(report.invited.len())
                }
            };
        }

        log_draw(event_id, count, report.invited.len(), report.shortfall, report.skipped.len());
        Ok(report)
    }

    /// Draw one replacement and send it the winner invitation
    pub async fn replace_and_notify(&self, event_id: &str) -> Result<(String, FanoutReport)> {
        let entrant_id = self.replacement.draw_replacement(event_id).await?;
        let fanout = match self
            .notifications
            .notify_entrants(
                event_id,
                std::slice::from_ref(&entrant_id),
                NotificationCategory::Winner,
                &self.winner_message,
                true,
            )
            .await
        {
            Ok(fanout) => fanout,
            Err(e) => {
                warn!(event_id, entrant_id = %entrant_id, error = %e, "Replacement notification not sent");
                FanoutReport::all_failed(1)
            }
        };
        Ok((entrant_id, fanout))
    }

    pub fn replacement_drawer(&self) -> &ReplacementDrawer {
        &self.replacement
    }
}
