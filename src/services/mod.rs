//! Services module
//!
//! This module contains the engine's business logic services

pub mod draw;
pub mod events;
pub mod invitation;
pub mod lifecycle;
pub mod lottery;
pub mod messaging;
pub mod moderation;
pub mod notification;
pub mod replacement;
pub mod tags;
pub mod waitlist;

// Re-export commonly used services
pub use draw::{DrawReport, DrawService};
pub use events::EventService;
pub use invitation::InvitationService;
pub use lifecycle::{LifecycleMachine, Transition, TransitionOutcome};
pub use lottery::{draw_winners, DrawResult, LotterySelector};
pub use messaging::{
    build_messenger, HttpPushMessenger, InMemoryTokenDirectory, LogOnlyMessenger, Messenger,
    RecordingMessenger, TokenDirectory,
};
pub use moderation::{ModerationService, OrganizerBanReport};
pub use notification::{FanoutReport, NotificationService};
pub use replacement::ReplacementDrawer;
pub use tags::TagService;
pub use waitlist::{JoinOutcome, WaitlistPool};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::{BanList, DatabaseService, InMemoryStore, LotteryStore, NotificationLog, TagStore};
use crate::utils::clock::Clock;
use crate::utils::errors::Result;

/// External collaborators the services are built on
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn LotteryStore>,
    pub log: Arc<dyn NotificationLog>,
    pub tags: Arc<dyn TagStore>,
    pub bans: Arc<dyn BanList>,
    pub messenger: Arc<dyn Messenger>,
    pub clock: Arc<dyn Clock>,
}

impl Backends {
    /// Everything on one in-memory store
    pub fn in_memory(store: Arc<InMemoryStore>, messenger: Arc<dyn Messenger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: store.clone(),
            log: store.clone(),
            tags: store.clone(),
            bans: store,
            messenger,
            clock,
        }
    }

    /// Everything on Postgres
    pub fn postgres(database: DatabaseService, messenger: Arc<dyn Messenger>, clock: Arc<dyn Clock>) -> Self {
        let database = Arc::new(database);
        Self {
            store: database.clone(),
            log: database.clone(),
            tags: database.clone(),
            bans: database,
            messenger,
            clock,
        }
    }
}

/// Service factory for creating and wiring all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub waitlist: WaitlistPool,
    pub lifecycle: LifecycleMachine,
    pub selector: Arc<LotterySelector>,
    pub replacement: ReplacementDrawer,
    pub notifications: NotificationService,
    pub draws: DrawService,
    pub invitations: InvitationService,
    pub events: EventService,
    pub tags: TagService,
    pub moderation: ModerationService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, backends: Backends) -> Result<Self> {
        settings.validate()?;

        let selector = Arc::new(LotterySelector::from_config(&settings.lottery));
        let lifecycle = LifecycleMachine::new(backends.store.clone(), backends.clock.clone());
        let waitlist = WaitlistPool::new(backends.store.clone(), backends.bans.clone());
        let replacement = ReplacementDrawer::new(
            backends.store.clone(),
            lifecycle.clone(),
            selector.clone(),
            settings.lottery.replacement_attempts,
        );
        let notifications = NotificationService::new(
            backends.store.clone(),
            backends.log.clone(),
            backends.messenger.clone(),
            backends.clock.clone(),
            &settings.messaging,
            &settings.lottery,
        );
        let draws = DrawService::new(
            backends.store.clone(),
            lifecycle.clone(),
            selector.clone(),
            replacement.clone(),
            notifications.clone(),
            settings.lottery.winner_message.clone(),
        );
        let invitations = InvitationService::new(lifecycle.clone(), backends.log.clone(), backends.clock.clone());
        let tags = TagService::new(backends.tags.clone());
        let events = EventService::new(
            backends.store.clone(),
            backends.log.clone(),
            backends.bans.clone(),
            tags.clone(),
            backends.clock.clone(),
            &settings.admin,
        );
        let moderation = ModerationService::new(
            backends.store.clone(),
            backends.bans.clone(),
            events.clone(),
            backends.clock.clone(),
        );

        Ok(Self {
            waitlist,
            lifecycle,
            selector,
            replacement,
            notifications,
            draws,
            invitations,
            events,
            tags,
            moderation,
        })
    }
}
