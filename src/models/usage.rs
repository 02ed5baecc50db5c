use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub message_count: i64,
    pub last_reset: DateTime<Utc>,
}

/// Outcome of a limit check. `allowed = false` is an ordinary result; the
/// caller decides how to surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub limit: u32,
    pub used: u32,
    pub next_reset_time: DateTime<Utc>,
}
