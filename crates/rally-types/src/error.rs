use crate::models::{InterestId, InterestStatus};

/// Failures of the interest lifecycle.
///
/// Everything except `StoreUnavailable` is a business-rule rejection and is
/// returned to the caller as-is; none of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InterestError {
    #[error("You cannot send an interest to yourself")]
    InvalidSelfInterest,

    #[error("Daily interest limit of {limit} reached")]
    RateLimitExceeded { limit: u32 },

    #[error("An interest to this user is already active")]
    DuplicateActiveInterest,

    #[error("Interest {0} not found")]
    NotFound(InterestId),

    #[error("You are not allowed to change this interest")]
    Forbidden,

    #[error("Interest is already {from} and can no longer change")]
    InvalidTransition { from: InterestStatus },

    #[error("Interest store unavailable: {0}")]
    StoreUnavailable(String),
}

impl InterestError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSelfInterest => "INVALID_SELF_INTEREST",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::DuplicateActiveInterest => "DUPLICATE_ACTIVE_INTEREST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn is_business_rule(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_))
    }
}
