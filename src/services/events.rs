//! Event administration

use std::sync::Arc;

use tracing::info;

use crate::config::AdminConfig;
use crate::database::{BanList, LotteryStore, NotificationLog};
use crate::models::tag::normalize_tags;
use crate::models::{BanKind, CreateEventRequest, Event, EventStatus};
use crate::services::tags::TagService;
use crate::utils::clock::Clock;
use crate::utils::errors::{LotteryError, Result};
use crate::utils::helpers::{generate_uuid, require_id};

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn LotteryStore>,
    log: Arc<dyn NotificationLog>,
    bans: Arc<dyn BanList>,
    tags: TagService,
    clock: Arc<dyn Clock>,
    admin_ids: Vec<String>,
}

impl EventService {
    pub fn new(
        store: Arc<dyn LotteryStore>,
        log: Arc<dyn NotificationLog>,
        bans: Arc<dyn BanList>,
        tags: TagService,
        clock: Arc<dyn Clock>,
        admin: &AdminConfig,
    ) -> Self {
        Self { store, log, bans, tags, clock, admin_ids: admin.admin_ids.clone() }
    }

    pub async fn create_event(&self, request: CreateEventRequest) -> Result<Event> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(LotteryError::InvalidInput("Event name must not be empty".to_string()));
        }
        require_id("Organizer id", &request.organizer_id)?;
        if self.bans.is_banned(&request.organizer_id, BanKind::Organizer).await? {
            return Err(LotteryError::PermissionDenied("Banned organizers cannot create events".to_string()));
        }
        if request.registration_close < request.registration_open {
            return Err(LotteryError::InvalidInput(
                "Registration must close after it opens".to_string(),
            ));
        }
        if request.capacity == Some(0) {
            return Err(LotteryError::InvalidInput("Capacity must be greater than 0".to_string()));
        }

        let event = Event {
            id: generate_uuid(),
            name: name.to_string(),
            description: request.description,
            organizer_id: request.organizer_id,
            capacity: request.capacity,
            registration_open: request.registration_open,
            registration_close: request.registration_close,
            status: request.status,
            tags: normalize_tags(&request.tags),
            created_at: self.clock.now(),
        };

        let event = self.store.create_event(event).await?;
        self.tags.register(&event.tags).await?;
        info!(event_id = %event.id, organizer_id = %event.organizer_id, "Event created");
        Ok(event)
    }

    pub async fn get_event(&self, event_id: &str) -> Result<Event> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| LotteryError::EventNotFound { event_id: event_id.to_string() })
    }

    pub async fn update_tags(&self, event_id: &str, actor_id: &str, tags: &[String]) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.ensure_can_manage(&event, actor_id)?;

        let old = std::mem::replace(&mut event.tags, normalize_tags(tags));
        let event = self.store.update_event(&event).await?;
        self.tags.update(&old, &event.tags).await?;
        Ok(event)
    }

    pub async fn set_status(&self, event_id: &str, actor_id: &str, status: EventStatus) -> Result<Event> {
        let mut event = self.get_event(event_id).await?;
        self.ensure_can_manage(&event, actor_id)?;

        event.status = status;
        let event = self.store.update_event(&event).await?;
        info!(event_id, status = %status, "Event status changed");
        Ok(event)
    }

    /// Remove the event with its participation rows and notifications
    pub async fn delete_event(&self, event_id: &str, actor_id: &str) -> Result<()> {
        let event = self.get_event(event_id).await?;
        self.ensure_can_manage(&event, actor_id)?;

        if !self.store.delete_event(event_id).await? {
            return Err(LotteryError::EventNotFound { event_id: event_id.to_string() });
        }
        let removed = self.log.delete_for_event(event_id).await?;
        self.tags.release(&event.tags).await?;

        info!(event_id, actor_id, notifications_removed = removed, "Event deleted");
        Ok(())
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == user_id)
    }

    /// `PermissionDenied` unless `actor_id` is a configured administrator
    pub fn ensure_admin(&self, actor_id: &str) -> Result<()> {
        if self.is_admin(actor_id) {
            Ok(())
        } else {
            Err(LotteryError::PermissionDenied("Admin access required".to_string()))
        }
    }

    fn ensure_can_manage(&self, event: &Event, actor_id: &str) -> Result<()> {
        if event.is_organizer(actor_id) || self.is_admin(actor_id) {
            Ok(())
        } else {
            Err(LotteryError::PermissionDenied(
                "Only the organizer or an administrator can change this event".to_string(),
            ))
        }
    }
}
