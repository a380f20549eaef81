//! In-memory service context for integration tests

use std::sync::Arc;

use EventLottery::config::Settings;
use EventLottery::database::{InMemoryStore, LotteryStore};
use EventLottery::models::{Event, ParticipantStatus, StatusTimestamps, Timestamp};
use EventLottery::services::{Backends, RecordingMessenger, ServiceFactory};
pub use EventLottery::utils::Clock;
use EventLottery::utils::FixedClock;

use super::simple_test::init_test_env;
use super::test_data::{event_request, ADMIN_ID, REGISTRATION_OPEN};

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.lottery.seed = Some(42);
    settings.admin.admin_ids = vec![ADMIN_ID.to_string()];
    settings
}

/// Services wired to one in-memory store, a recording messenger and a
/// manual clock
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub messenger: Arc<RecordingMessenger>,
    pub clock: Arc<FixedClock>,
    pub settings: Settings,
    pub services: ServiceFactory,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_test_env();
        let store = Arc::new(InMemoryStore::new());
        let messenger = Arc::new(RecordingMessenger::new());
        let clock = Arc::new(FixedClock::new(Timestamp(REGISTRATION_OPEN + 1)));
        let backends = Backends::in_memory(store.clone(), messenger.clone(), clock.clone());
        let services = ServiceFactory::new(&settings, backends).expect("test settings are valid");

        Self { store, messenger, clock, settings, services }
    }

    pub async fn create_event(&self, capacity: Option<u32>) -> Event {
        self.services
            .events
            .create_event(event_request(capacity))
            .await
            .expect("Failed to create event")
    }

    /// Join in order, one millisecond apart
    pub async fn join_all<S: AsRef<str>>(&self, event_id: &str, entrant_ids: &[S]) {
        for id in entrant_ids {
            self.clock.advance(1);
            self.services
                .waitlist
                .join(event_id, id.as_ref(), self.clock.now())
                .await
                .expect("Failed to join waitlist");
        }
    }

    pub async fn status_of(&self, event_id: &str, entrant_id: &str) -> Option<ParticipantStatus> {
        self.store
            .get_entrant_status(event_id, entrant_id)
            .await
            .expect("store read failed")
            .map(|row| row.status)
    }

    pub async fn count_in(&self, event_id: &str, status: ParticipantStatus) -> usize {
        self.store
            .get_entrant_statuses(event_id)
            .await
            .expect("store read failed")
            .iter()
            .filter(|row| row.status == status)
            .count()
    }

    /// Write a status directly, bypassing the lifecycle
    pub async fn force_status(&self, event_id: &str, entrant_id: &str, status: ParticipantStatus) {
        self.store
            .compare_and_set_status(event_id, entrant_id, None, status, StatusTimestamps::default())
            .await
            .expect("store write failed");
    }
}
