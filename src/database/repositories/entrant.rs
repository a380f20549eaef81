//! Entrant status repository implementation

use sqlx::{FromRow, PgPool};
use crate::models::{EntrantStatus, ParticipantStatus, StatusTimestamps, Timestamp};
use crate::utils::errors::LotteryError;

const ENTRANT_COLUMNS: &str =
    "event_id, entrant_id, status, request_time, invited_at, responded_at, is_replacement";

#[derive(Debug, FromRow)]
struct EntrantRow {
    event_id: String,
    entrant_id: String,
    status: String,
    request_time: i64,
    invited_at: Option<i64>,
    responded_at: Option<i64>,
    is_replacement: bool,
}

impl TryFrom<EntrantRow> for EntrantStatus {
    type Error = LotteryError;

    fn try_from(row: EntrantRow) -> Result<Self, Self::Error> {
        Ok(EntrantStatus {
            status: row.status.parse::<ParticipantStatus>()?,
            event_id: row.event_id,
            entrant_id: row.entrant_id,
            request_time: Timestamp(row.request_time),
            invited_at: row.invited_at.map(Timestamp),
            responded_at: row.responded_at.map(Timestamp),
            is_replacement: row.is_replacement,
        })
    }
}

fn into_statuses(rows: Vec<EntrantRow>) -> Result<Vec<EntrantStatus>, LotteryError> {
    rows.into_iter().map(EntrantStatus::try_from).collect()
}

#[derive(Clone)]
pub struct EntrantRepository {
    pool: PgPool,
}

impl EntrantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<EntrantStatus>, LotteryError> {
        let rows = sqlx::query_as::<_, EntrantRow>(&format!(
            "SELECT {ENTRANT_COLUMNS} FROM entrant_statuses WHERE event_id = $1 ORDER BY request_time, entrant_id"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        into_statuses(rows)
    }

    pub async fn find(&self, event_id: &str, entrant_id: &str) -> Result<Option<EntrantStatus>, LotteryError> {
        let row = sqlx::query_as::<_, EntrantRow>(&format!(
            "SELECT {ENTRANT_COLUMNS} FROM entrant_statuses WHERE event_id = $1 AND entrant_id = $2"
        ))
        .bind(event_id)
        .bind(entrant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EntrantStatus::try_from).transpose()
    }

    pub async fn history(&self, entrant_id: &str) -> Result<Vec<EntrantStatus>, LotteryError> {
        let rows = sqlx::query_as::<_, EntrantRow>(&format!(
            "SELECT {ENTRANT_COLUMNS} FROM entrant_statuses WHERE entrant_id = $1 ORDER BY request_time DESC, event_id"
        ))
        .bind(entrant_id)
        .fetch_all(&self.pool)
        .await?;

        into_statuses(rows)
    }

    /// Insert the row unless one already exists for the key; `None` on conflict
    pub async fn insert_if_absent(&self, row: &EntrantStatus) -> Result<Option<EntrantStatus>, LotteryError> {
        let inserted = sqlx::query_as::<_, EntrantRow>(&format!(
            r#"
            INSERT INTO entrant_statuses ({ENTRANT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_id, entrant_id) DO NOTHING
            RETURNING {ENTRANT_COLUMNS}
            "#
        ))
        .bind(&row.event_id)
        .bind(&row.entrant_id)
        .bind(row.status.as_str())
        .bind(row.request_time.as_millis())
        .bind(row.invited_at.map(|t| t.as_millis()))
        .bind(row.responded_at.map(|t| t.as_millis()))
        .bind(row.is_replacement)
        .fetch_optional(&self.pool)
        .await?;

        inserted.map(EntrantStatus::try_from).transpose()
    }

    /// Delete the row only while it holds `expected`
    pub async fn delete_if_status(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: ParticipantStatus,
    ) -> Result<Option<EntrantStatus>, LotteryError> {
        let deleted = sqlx::query_as::<_, EntrantRow>(&format!(
            r#"
            DELETE FROM entrant_statuses
            WHERE event_id = $1 AND entrant_id = $2 AND status = $3
            RETURNING {ENTRANT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(entrant_id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        deleted.map(EntrantStatus::try_from).transpose()
    }

    /// Conditional status update in a single statement; `None` when the
    /// row is missing or holds a different status.
    pub async fn compare_and_set(
        &self,
        event_id: &str,
        entrant_id: &str,
        expected: Option<ParticipantStatus>,
        new: ParticipantStatus,
        stamps: &StatusTimestamps,
    ) -> Result<Option<EntrantStatus>, LotteryError> {
        let updated = sqlx::query_as::<_, EntrantRow>(&format!(
            r#"
            UPDATE entrant_statuses
            SET status = $3,
                invited_at = COALESCE($4, invited_at),
                responded_at = COALESCE($5, responded_at),
                is_replacement = COALESCE($6, is_replacement)
            WHERE event_id = $1 AND entrant_id = $2 AND ($7::TEXT IS NULL OR status = $7)
            RETURNING {ENTRANT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(entrant_id)
        .bind(new.as_str())
        .bind(stamps.invited_at.map(|t| t.as_millis()))
        .bind(stamps.responded_at.map(|t| t.as_millis()))
        .bind(stamps.is_replacement)
        .bind(expected.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        updated.map(EntrantStatus::try_from).transpose()
    }
}
