//! Tag usage repository implementation

use sqlx::PgPool;
use crate::models::{Tag, Timestamp};
use crate::utils::errors::LotteryError;

#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tag on first use, otherwise bump its counter
    pub async fn increment(&self, name: &str) -> Result<i64, LotteryError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tags (name, usage_count, created_at)
            VALUES ($1, 1, $2)
            ON CONFLICT (name) DO UPDATE SET usage_count = tags.usage_count + 1
            RETURNING usage_count
            "#
        )
        .bind(name)
        .bind(Timestamp::now().as_millis())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn decrement(&self, name: &str) -> Result<i64, LotteryError> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE tags SET usage_count = GREATEST(usage_count - 1, 0) WHERE name = $1 RETURNING usage_count"
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(count.unwrap_or(0))
    }

    pub async fn list(&self) -> Result<Vec<Tag>, LotteryError> {
        let tags = sqlx::query_as::<_, Tag>("SELECT name, usage_count FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }
}
