use crate::models::plan::PlanTier;

pub const FREE_DAILY_MESSAGE_LIMIT: u32 = 3;
pub const PREMIUM_DAILY_MESSAGE_LIMIT: u32 = 9;

/// Per-tier quotas for gated chat messages within one reset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyLimits {
    pub free: u32,
    pub premium: u32,
}

impl Default for DailyLimits {
    fn default() -> Self {
        Self {
            free: FREE_DAILY_MESSAGE_LIMIT,
            premium: PREMIUM_DAILY_MESSAGE_LIMIT,
        }
    }
}

impl DailyLimits {
    pub fn for_tier(&self, tier: PlanTier) -> u32 {
        match tier {
            PlanTier::Free => self.free,
            PlanTier::Premium => self.premium,
        }
    }
}
