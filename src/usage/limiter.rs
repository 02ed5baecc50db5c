use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, error};

use super::window::ResetWindow;
use crate::{
    db::usage_repository::UsageRepository,
    models::{
        plan::PlanTier,
        usage::{UsageDecision, UsageRecord},
    },
    utils::plan_limits::DailyLimits,
};

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("user id must not be empty")]
    InvalidArgument,
    #[error("usage store unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}

pub struct UsageLimiter {
    store: Arc<dyn UsageRepository>,
    window: ResetWindow,
    limits: DailyLimits,
}

impl UsageLimiter {
    pub fn new(store: Arc<dyn UsageRepository>, window: ResetWindow, limits: DailyLimits) -> Self {
        Self {
            store,
            window,
            limits,
        }
    }

    pub fn window(&self) -> &ResetWindow {
        &self.window
    }

    pub async fn check_limit(
        &self,
        user_id: &str,
        tier: PlanTier,
    ) -> Result<UsageDecision, UsageError> {
        self.check_limit_at(user_id, tier, Utc::now()).await
    }

    pub async fn check_limit_at(
        &self,
        user_id: &str,
        tier: PlanTier,
        now: DateTime<Utc>,
    ) -> Result<UsageDecision, UsageError> {
        let user_id = validate_user_id(user_id)?;
        let record = self.store.find_usage(user_id).await.map_err(|err| {
            error!(%user_id, ?err, "failed to load message usage");
            UsageError::StorageUnavailable(err)
        })?;

        let decision = self.decide(record.as_ref(), tier, now);
        debug!(
            %user_id,
            plan = tier.as_str(),
            used = decision.used,
            remaining = decision.remaining,
            allowed = decision.allowed,
            "checked message usage"
        );
        Ok(decision)
    }

    pub async fn record_usage(&self, user_id: &str) -> Result<UsageRecord, UsageError> {
        self.record_usage_at(user_id, Utc::now()).await
    }

    pub async fn record_usage_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, UsageError> {
        let user_id = validate_user_id(user_id)?;
        let (window_start, window_end) = self.window.current_bounds(now);

        let record = self
            .store
            .increment_usage(user_id, window_start, window_end, now)
            .await
            .map_err(|err| {
                error!(%user_id, ?err, "failed to record message usage");
                UsageError::StorageUnavailable(err)
            })?;

        debug!(
            %user_id,
            message_count = record.message_count,
            last_reset = %record.last_reset,
            "recorded message usage"
        );
        Ok(record)
    }

    fn decide(
        &self,
        record: Option<&UsageRecord>,
        tier: PlanTier,
        now: DateTime<Utc>,
    ) -> UsageDecision {
        let limit = self.limits.for_tier(tier);

        let (used, next_reset_time) = match record {
            None => (0, now + Duration::hours(24)),
            Some(record) if self.window.is_same_day(record.last_reset, now) => (
                clamp_count(record.message_count),
                self.window.start_of_next_day(record.last_reset),
            ),
            Some(_) => (0, self.window.start_of_next_day(now)),
        };

        UsageDecision {
            allowed: used < limit,
            remaining: limit.saturating_sub(used),
            limit,
            used,
            next_reset_time,
        }
    }
}

fn validate_user_id(user_id: &str) -> Result<&str, UsageError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(UsageError::InvalidArgument);
    }
    Ok(trimmed)
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
