use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::usage::UsageRecord;

#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn find_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, sqlx::Error>;

    /// Atomically counts one gated action.
    ///
    /// Creates the record with a count of 1 when missing. When the stored
    /// `last_reset` lies outside `[window_start, window_end)` the record is
    /// reset to a count of 1 with `last_reset = now`; otherwise the count is
    /// incremented in place. Returns the record as written.
    async fn increment_usage(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, sqlx::Error>;
}
