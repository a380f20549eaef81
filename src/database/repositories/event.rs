//! Event repository implementation

use sqlx::{FromRow, PgPool};
use crate::models::{Event, Timestamp};
use crate::utils::errors::LotteryError;

const EVENT_COLUMNS: &str =
    "id, name, description, organizer_id, capacity, registration_open, registration_close, status, tags, created_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: String,
    name: String,
    description: Option<String>,
    organizer_id: String,
    capacity: Option<i32>,
    registration_open: i64,
    registration_close: i64,
    status: String,
    tags: Vec<String>,
    created_at: i64,
}

impl TryFrom<EventRow> for Event {
    type Error = LotteryError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let capacity = row
            .capacity
            .map(|c| {
                u32::try_from(c)
                    .map_err(|_| LotteryError::CorruptRecord(format!("Event {} has negative capacity", row.id)))
            })
            .transpose()?;

        Ok(Event {
            status: row.status.parse::<crate::models::EventStatus>()?,
            id: row.id,
            name: row.name,
            description: row.description,
            organizer_id: row.organizer_id,
            capacity,
            registration_open: Timestamp(row.registration_open),
            registration_close: Timestamp(row.registration_close),
            tags: row.tags,
            created_at: Timestamp(row.created_at),
        })
    }
}

fn capacity_param(event: &Event) -> Result<Option<i32>, LotteryError> {
    event
        .capacity
        .map(|c| i32::try_from(c).map_err(|_| LotteryError::InvalidInput(format!("Capacity {} is too large", c))))
        .transpose()
}

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event
    pub async fn create(&self, event: &Event) -> Result<Event, LotteryError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events ({EVENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.organizer_id)
        .bind(capacity_param(event)?)
        .bind(event.registration_open.as_millis())
        .bind(event.registration_close.as_millis())
        .bind(event.status.as_str())
        .bind(&event.tags)
        .bind(event.created_at.as_millis())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>, LotteryError> {
        let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Event::try_from).transpose()
    }

    pub async fn exists(&self, id: &str) -> Result<bool, LotteryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// Update event; `None` when the event is gone
    pub async fn update(&self, event: &Event) -> Result<Option<Event>, LotteryError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET name = $2,
                description = $3,
                capacity = $4,
                registration_open = $5,
                registration_close = $6,
                status = $7,
                tags = $8
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(capacity_param(event)?)
        .bind(event.registration_open.as_millis())
        .bind(event.registration_close.as_millis())
        .bind(event.status.as_str())
        .bind(&event.tags)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Delete event; dependent rows go with it through ON DELETE CASCADE
    pub async fn delete(&self, id: &str) -> Result<bool, LotteryError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Events created by one organizer, newest first
    pub async fn list_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>, LotteryError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE organizer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Event::try_from).collect()
    }
}
