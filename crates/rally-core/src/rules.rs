use chrono::Duration;

/// Default cap on new interests per sender per window.
pub const DAILY_INTEREST_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct InterestRules {
    /// Creations allowed per sender within `window`. Withdrawn interests
    /// still count: every creation consumes one slot.
    pub daily_limit: u32,
    /// Rolling window measured back from now over each record's `sent_at`.
    pub window: Duration,
}

impl InterestRules {
    pub fn with_daily_limit(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            ..Self::default()
        }
    }
}

impl Default for InterestRules {
    fn default() -> Self {
        Self {
            daily_limit: DAILY_INTEREST_LIMIT,
            window: Duration::hours(24),
        }
    }
}
