//! Entrant lifecycle state machine
//!
//! ```text
//! WAITLISTED --invite--> INVITED --accept--> ENROLLED --cancel--> CANCELLED
//!                           \--decline--> DECLINED
//! ```
//!
//! Every write is a compare-and-set against the status the transition
//! starts from, so a concurrent writer can never be overwritten.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::database::{CasOutcome, LotteryStore};
use crate::models::{EntrantStatus, ParticipantStatus, StatusTimestamps};
use crate::utils::clock::Clock;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::logging::log_entrant_action;

/// Named edges of the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Invite,
    Replace,
    Accept,
    Decline,
    Cancel,
}

impl Transition {
    pub fn from_status(&self) -> ParticipantStatus {
        match self {
            Transition::Invite | Transition::Replace => ParticipantStatus::Waitlisted,
            Transition::Accept | Transition::Decline => ParticipantStatus::Invited,
            Transition::Cancel => ParticipantStatus::Enrolled,
        }
    }

    pub fn to_status(&self) -> ParticipantStatus {
        match self {
            Transition::Invite | Transition::Replace => ParticipantStatus::Invited,
            Transition::Accept => ParticipantStatus::Enrolled,
            Transition::Decline => ParticipantStatus::Declined,
            Transition::Cancel => ParticipantStatus::Cancelled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transition::Invite => "invite",
            Transition::Replace => "replace",
            Transition::Accept => "accept",
            Transition::Decline => "decline",
            Transition::Cancel => "cancel",
        }
    }
}

/// Whether `from -> to` is an edge of the lifecycle
pub fn is_legal(from: ParticipantStatus, to: ParticipantStatus) -> bool {
    use ParticipantStatus::*;
    matches!(
        (from, to),
        (Waitlisted, Invited) | (Invited, Enrolled) | (Invited, Declined) | (Enrolled, Cancelled)
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied(EntrantStatus),
    /// Already in the target status
    Unchanged(EntrantStatus),
}

impl TransitionOutcome {
    pub fn row(&self) -> &EntrantStatus {
        match self {
            TransitionOutcome::Applied(row) | TransitionOutcome::Unchanged(row) => row,
        }
    }

    pub fn into_row(self) -> EntrantStatus {
        match self {
            TransitionOutcome::Applied(row) | TransitionOutcome::Unchanged(row) => row,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied(_))
    }
}

#[derive(Clone)]
pub struct LifecycleMachine {
    store: Arc<dyn LotteryStore>,
    clock: Arc<dyn Clock>,
}

impl LifecycleMachine {
    pub fn new(store: Arc<dyn LotteryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// INVITED -> ENROLLED
    pub async fn accept(&self, event_id: &str, entrant_id: &str) -> Result<TransitionOutcome> {
        self.apply(event_id, entrant_id, Transition::Accept).await
    }

    /// INVITED -> DECLINED. The freed spot is not refilled automatically.
    pub async fn decline(&self, event_id: &str, entrant_id: &str) -> Result<TransitionOutcome> {
        self.apply(event_id, entrant_id, Transition::Decline).await
    }

    /// ENROLLED -> CANCELLED
    pub async fn cancel(&self, event_id: &str, entrant_id: &str) -> Result<TransitionOutcome> {
        self.apply(event_id, entrant_id, Transition::Cancel).await
    }

    /// WAITLISTED -> INVITED. Only the draw and the replacement drawer call this.
    pub(crate) async fn invite(&self, event_id: &str, entrant_id: &str, replacement: bool) -> Result<TransitionOutcome> {
        let transition = if replacement { Transition::Replace } else { Transition::Invite };
        self.apply(event_id, entrant_id, transition).await
    }

    /// Move an entrant to `target` by whichever response edge leads there.
    /// Invitations are issued only by draws, so WAITLISTED and INVITED
    /// targets never apply.
    pub async fn transition_to(
        &self,
        event_id: &str,
        entrant_id: &str,
        target: ParticipantStatus,
    ) -> Result<TransitionOutcome> {
        match target {
            ParticipantStatus::Enrolled => self.accept(event_id, entrant_id).await,
            ParticipantStatus::Declined => self.decline(event_id, entrant_id).await,
            ParticipantStatus::Cancelled => self.cancel(event_id, entrant_id).await,
            ParticipantStatus::Waitlisted | ParticipantStatus::Invited => {
                let current = self.current(event_id, entrant_id).await?;
                if current.status == target {
                    return Ok(TransitionOutcome::Unchanged(current));
                }
                Err(LotteryError::IllegalTransition {
                    entrant_id: entrant_id.to_string(),
                    from: current.status,
                    to: target,
                })
            }
        }
    }

    async fn current(&self, event_id: &str, entrant_id: &str) -> Result<EntrantStatus> {
        self.store
            .get_entrant_status(event_id, entrant_id)
            .await?
            .ok_or_else(|| LotteryError::EntrantNotFound {
                event_id: event_id.to_string(),
                entrant_id: entrant_id.to_string(),
            })
    }

    async fn apply(&self, event_id: &str, entrant_id: &str, transition: Transition) -> Result<TransitionOutcome> {
        let target = transition.to_status();
        let current = self.current(event_id, entrant_id).await?;

        if current.status == target {
            debug!(event_id, entrant_id, status = %target, "Transition already applied");
            return Ok(TransitionOutcome::Unchanged(current));
        }

        if current.status != transition.from_status() || !is_legal(current.status, target) {
            return Err(LotteryError::IllegalTransition {
                entrant_id: entrant_id.to_string(),
                from: current.status,
                to: target,
            });
        }

        let now = self.clock.now();
        let stamps = match transition {
            Transition::Invite => StatusTimestamps::invited(now, false),
            Transition::Replace => StatusTimestamps::invited(now, true),
            Transition::Accept | Transition::Decline | Transition::Cancel => StatusTimestamps::responded(now),
        };

        match self
            .store
            .compare_and_set_status(event_id, entrant_id, Some(current.status), target, stamps)
            .await?
        {
            CasOutcome::Applied(row) => {
                log_entrant_action(event_id, entrant_id, transition.name(), Some(target.as_str()));
                Ok(TransitionOutcome::Applied(row))
            }
            CasOutcome::Conflict { actual: Some(actual) } if actual == target => {
                let row = self
                    .store
                    .get_entrant_status(event_id, entrant_id)
                    .await?
                    .ok_or_else(|| LotteryError::Conflict {
                        event_id: event_id.to_string(),
                        entrant_id: entrant_id.to_string(),
                    })?;
                Ok(TransitionOutcome::Unchanged(row))
            }
            CasOutcome::Conflict { actual } => {
                warn!(event_id, entrant_id, expected = %current.status, actual = ?actual, "Concurrent status change");
                Err(LotteryError::Conflict {
                    event_id: event_id.to_string(),
                    entrant_id: entrant_id.to_string(),
                })
            }
        }
    }
}
