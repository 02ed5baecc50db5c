use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::subscription_repository::SubscriptionRepository;

pub struct PostgresSubscriptionRepository {
    pub pool: PgPool,
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn find_active_plan(&self, user_id: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT plan
            FROM user_subscriptions
            WHERE user_id = $1
              AND status IN ('active', 'trialing')
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
