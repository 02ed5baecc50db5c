use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{subscription_repository::SubscriptionRepository, usage_repository::UsageRepository};
use crate::models::usage::UsageRecord;

/// In-memory usage store. Each increment runs under the map's per-key entry
/// lock, so it has the same atomicity as the Postgres upsert.
#[derive(Default)]
pub struct MockUsageRepository {
    records: DashMap<String, UsageRecord>,
    writes: AtomicUsize,
    pub should_fail: bool,
}

impl MockUsageRepository {
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    pub fn seed(&self, record: UsageRecord) {
        self.records.insert(record.user_id.clone(), record);
    }

    pub fn record(&self, user_id: &str) -> Option<UsageRecord> {
        self.records.get(user_id).map(|entry| entry.clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageRepository for MockUsageRepository {
    async fn find_usage(&self, user_id: &str) -> Result<Option<UsageRecord>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(self.record(user_id))
    }

    async fn increment_usage(
        &self,
        user_id: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<UsageRecord, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut entry = self
            .records
            .entry(user_id.to_string())
            .or_insert_with(|| UsageRecord {
                user_id: user_id.to_string(),
                message_count: 0,
                last_reset: now,
            });

        if entry.last_reset < window_start || entry.last_reset >= window_end {
            entry.message_count = 0;
            entry.last_reset = now;
        }
        entry.message_count += 1;
        let updated = entry.clone();
        drop(entry);

        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(updated)
    }
}

#[derive(Default)]
pub struct MockSubscriptionRepository {
    pub plans: HashMap<String, String>,
    pub should_fail: bool,
}

impl MockSubscriptionRepository {
    pub fn with_plan(user_id: &str, plan: &str) -> Self {
        Self {
            plans: HashMap::from([(user_id.to_string(), plan.to_string())]),
            should_fail: false,
        }
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_active_plan(&self, user_id: &str) -> Result<Option<String>, sqlx::Error> {
        if self.should_fail {
            return Err(sqlx::Error::Protocol("Mock DB failure".into()));
        }
        Ok(self.plans.get(user_id).cloned())
    }
}
