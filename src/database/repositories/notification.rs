//! Notification log repository implementation

use sqlx::{FromRow, PgPool};
use crate::models::{InvitationResponse, NotificationCategory, NotificationEntry, Timestamp};
use crate::utils::errors::LotteryError;

const NOTIFICATION_COLUMNS: &str =
    "id, event_id, event_name, entrant_id, message, category, created_at, is_read, response, responded_at, delivered";

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: String,
    event_id: String,
    event_name: String,
    entrant_id: String,
    message: String,
    category: String,
    created_at: i64,
    is_read: bool,
    response: Option<String>,
    responded_at: Option<i64>,
    delivered: bool,
}

impl TryFrom<NotificationRow> for NotificationEntry {
    type Error = LotteryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(NotificationEntry {
            category: row.category.parse::<NotificationCategory>()?,
            response: row.response.as_deref().map(str::parse::<InvitationResponse>).transpose()?,
            id: row.id,
            event_id: row.event_id,
            event_name: row.event_name,
            entrant_id: row.entrant_id,
            message: row.message,
            created_at: Timestamp(row.created_at),
            read: row.is_read,
            responded_at: row.responded_at.map(Timestamp),
            delivered: row.delivered,
        })
    }
}

fn into_entries(rows: Vec<NotificationRow>) -> Result<Vec<NotificationEntry>, LotteryError> {
    rows.into_iter().map(NotificationEntry::try_from).collect()
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, entry: &NotificationEntry) -> Result<(), LotteryError> {
        sqlx::query(&format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(&entry.id)
        .bind(&entry.event_id)
        .bind(&entry.event_name)
        .bind(&entry.entrant_id)
        .bind(&entry.message)
        .bind(entry.category.as_str())
        .bind(entry.created_at.as_millis())
        .bind(entry.read)
        .bind(entry.response.map(|r| r.as_str()))
        .bind(entry.responded_at.map(|t| t.as_millis()))
        .bind(entry.delivered)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<NotificationEntry>, LotteryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotificationEntry::try_from).transpose()
    }

    pub async fn list_for_entrant(&self, entrant_id: &str) -> Result<Vec<NotificationEntry>, LotteryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE entrant_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(entrant_id)
        .fetch_all(&self.pool)
        .await?;

        into_entries(rows)
    }

    pub async fn list_all(&self, limit: i64) -> Result<Vec<NotificationEntry>, LotteryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_entries(rows)
    }

    pub async fn exists(&self, entrant_id: &str, event_id: &str, category: NotificationCategory) -> Result<bool, LotteryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE entrant_id = $1 AND event_id = $2 AND category = $3)"
        )
        .bind(entrant_id)
        .bind(event_id)
        .bind(category.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn mark_read(&self, id: &str) -> Result<Option<NotificationEntry>, LotteryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotificationEntry::try_from).transpose()
    }

    pub async fn record_response(
        &self,
        id: &str,
        response: InvitationResponse,
        at: Timestamp,
    ) -> Result<Option<NotificationEntry>, LotteryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, response = $2, responded_at = $3
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(response.as_str())
        .bind(at.as_millis())
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotificationEntry::try_from).transpose()
    }

    pub async fn delete_for_event(&self, event_id: &str) -> Result<u64, LotteryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE event_id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
