use async_trait::async_trait;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Plan name of the user's active or trialing subscription, if any.
    async fn find_active_plan(&self, user_id: &str) -> Result<Option<String>, sqlx::Error>;
}
