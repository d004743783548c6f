use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One usage window reported by the OAuth usage endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RateLimitWindow {
    /// Percent of the window used, 0–100.
    pub utilization: f64,
    pub resets_at: Option<DateTime<Utc>>,
}

impl RateLimitWindow {
    /// Whole minutes until the window resets, never negative.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        self.resets_at
            .map(|reset| (reset - now).num_minutes().max(0))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct RateLimits {
    pub five_hour: Option<RateLimitWindow>,
    pub seven_day: Option<RateLimitWindow>,
}

impl RateLimits {
    pub fn is_empty(&self) -> bool {
        self.five_hour.is_none() && self.seven_day.is_none()
    }
}
