use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::{db::usage_repository::UsageRepository, models::usage::UsageRecord};

pub struct PostgresUsageRepository {
    pub pool: PgPool,
}

#[async_trait]
impl UsageRepository for PostgresUsageRepository {
    async fn find_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, sqlx::Error> {
        sqlx::query_as::<_, UsageRecord>(
            r#"
            SELECT user_id, message_count, last_reset
            FROM message_usage
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, sqlx::Error> {
        // Single statement so concurrent requests for the same user serialize
        // on the row lock instead of racing a read-then-write.
        sqlx::query_as::<_, UsageRecord>(
            r#"
            INSERT INTO message_usage (user_id, message_count, last_reset, updated_at)
            VALUES ($1, 1, $4, now())
            ON CONFLICT (user_id) DO UPDATE SET
                message_count = CASE
                    WHEN message_usage.last_reset < $2 OR message_usage.last_reset >= $3 THEN 1
                    ELSE message_usage.message_count + 1
                END,
                last_reset = CASE
                    WHEN message_usage.last_reset < $2 OR message_usage.last_reset >= $3 THEN $4
                    ELSE message_usage.last_reset
                END,
                updated_at = now()
            RETURNING user_id, message_count, last_reset
            "#,
        )
        .bind(user_id)
        .bind(window_start)
        .bind(window_end)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }
}
