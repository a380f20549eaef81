//! Ban repository implementation

use sqlx::{FromRow, PgPool};
use crate::models::{Ban, BanKind, Timestamp};
use crate::utils::errors::LotteryError;

#[derive(Debug, FromRow)]
struct BanRow {
    subject_id: String,
    kind: String,
    banned_by: String,
    banned_at: i64,
}

impl TryFrom<BanRow> for Ban {
    type Error = LotteryError;

    fn try_from(row: BanRow) -> Result<Self, Self::Error> {
        Ok(Ban {
            kind: row.kind.parse::<BanKind>()?,
            subject_id: row.subject_id,
            banned_by: row.banned_by,
            banned_at: Timestamp(row.banned_at),
        })
    }
}

#[derive(Clone)]
pub struct BanRepository {
    pool: PgPool,
}

impl BanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the ban; `false` when it already existed
    pub async fn insert(&self, ban: &Ban) -> Result<bool, LotteryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO bans (subject_id, kind, banned_by, banned_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_id, kind) DO NOTHING
            "#
        )
        .bind(&ban.subject_id)
        .bind(ban.kind.as_str())
        .bind(&ban.banned_by)
        .bind(ban.banned_at.as_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn exists(&self, subject_id: &str, kind: BanKind) -> Result<bool, LotteryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bans WHERE subject_id = $1 AND kind = $2)"
        )
        .bind(subject_id)
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list(&self, kind: BanKind) -> Result<Vec<Ban>, LotteryError> {
        let rows = sqlx::query_as::<_, BanRow>(
            "SELECT subject_id, kind, banned_by, banned_at FROM bans WHERE kind = $1 ORDER BY banned_at DESC"
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Ban::try_from).collect()
    }
}
