use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
}

impl PlanTier {
    /// Maps a stored subscription plan or token claim onto a tier. Billing
    /// plans carry suffixes such as `premium_monthly` or `pro:annual`;
    /// anything unrecognised is free.
    pub fn from_plan(raw: Option<&str>) -> Self {
        let normalized = raw.unwrap_or_default().trim().to_lowercase();
        if normalized.is_empty() {
            return Self::Free;
        }

        let key = normalized
            .split([':', '-', '_', ' ', '/', '.'])
            .next()
            .unwrap_or(normalized.as_str());

        match key {
            "premium" | "pro" | "plus" | "unlimited" | "paid" | "monthly" | "annual"
            | "yearly" => Self::Premium,
            "free" | "basic" | "trial" | "starter" | "none" => Self::Free,
            _ if normalized.contains("premium") || normalized.contains("unlimited") => {
                Self::Premium
            }
            _ => Self::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Premium => "premium",
        }
    }
}
