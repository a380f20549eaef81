//! Invitation responses
//!
//! Accept or decline an invitation and record the answer on the
//! notification that carried it.

use std::sync::Arc;

use tracing::warn;

use crate::database::NotificationLog;
use crate::models::{InvitationResponse, NotificationEntry};
use crate::services::lifecycle::{LifecycleMachine, TransitionOutcome};
use crate::utils::clock::Clock;
use crate::utils::errors::{LotteryError, Result};

#[derive(Clone)]
pub struct InvitationService {
    lifecycle: LifecycleMachine,
    log: Arc<dyn NotificationLog>,
    clock: Arc<dyn Clock>,
}

impl InvitationService {
    pub fn new(lifecycle: LifecycleMachine, log: Arc<dyn NotificationLog>, clock: Arc<dyn Clock>) -> Self {
        Self { lifecycle, log, clock }
    }

    pub async fn accept(
        &self,
        event_id: &str,
        entrant_id: &str,
        notification_id: Option<&str>,
    ) -> Result<TransitionOutcome> {
        self.respond(event_id, entrant_id, notification_id, InvitationResponse::Accepted).await
    }

    /// The spot stays open until the organizer draws a replacement
    pub async fn decline(
        &self,
        event_id: &str,
        entrant_id: &str,
        notification_id: Option<&str>,
    ) -> Result<TransitionOutcome> {
        self.respond(event_id, entrant_id, notification_id, InvitationResponse::Declined).await
    }

    pub async fn cancel_enrollment(&self, event_id: &str, entrant_id: &str) -> Result<TransitionOutcome> {
        self.lifecycle.cancel(event_id, entrant_id).await
    }

    async fn respond(
        &self,
        event_id: &str,
        entrant_id: &str,
        notification_id: Option<&str>,
        response: InvitationResponse,
    ) -> Result<TransitionOutcome> {
        let notification = match notification_id {
            Some(id) => Some(self.owned_notification(id, event_id, entrant_id).await?),
            None => None,
        };

        let outcome = match response {
            InvitationResponse::Accepted => self.lifecycle.accept(event_id, entrant_id).await?,
            InvitationResponse::Declined => self.lifecycle.decline(event_id, entrant_id).await?,
        };

        // the transition is already committed
        if let Some(notification) = notification {
            if let Err(e) = self.log.record_response(&notification.id, response, self.clock.now()).await {
                warn!(
                    event_id,
                    entrant_id,
                    notification_id = %notification.id,
                    error = %e,
                    "Failed to record invitation response"
                );
            }
        }
        Ok(outcome)
    }

    async fn owned_notification(&self, id: &str, event_id: &str, entrant_id: &str) -> Result<NotificationEntry> {
        let entry = self
            .log
            .get(id)
            .await?
            .ok_or_else(|| LotteryError::NotificationNotFound { notification_id: id.to_string() })?;
        if entry.entrant_id != entrant_id || entry.event_id != event_id {
            return Err(LotteryError::PermissionDenied(
                "Notification belongs to another invitation".to_string(),
            ));
        }
        Ok(entry)
    }
}
