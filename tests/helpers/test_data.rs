//! Test fixtures

use EventLottery::models::{CreateEventRequest, EventStatus, Timestamp};

pub const ORGANIZER_ID: &str = "organizer-1";
pub const ADMIN_ID: &str = "admin-1";
pub const REGISTRATION_OPEN: i64 = 1_000;
pub const REGISTRATION_CLOSE: i64 = 100_000;

/// `device-00`, `device-01`, ...
pub fn entrant_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("device-{:02}", i)).collect()
}

pub fn event_request(capacity: Option<u32>) -> CreateEventRequest {
    CreateEventRequest {
        name: "Community Swim Lessons".to_string(),
        description: Some("Beginner lessons at the city pool".to_string()),
        organizer_id: ORGANIZER_ID.to_string(),
        capacity,
        registration_open: Timestamp(REGISTRATION_OPEN),
        registration_close: Timestamp(REGISTRATION_CLOSE),
        status: EventStatus::Open,
        tags: vec!["Sports".to_string(), " outdoor ".to_string()],
    }
}
