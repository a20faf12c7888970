//! Interest lifecycle rules on top of the store: sending, responding,
//! withdrawing, bucket views and "new activity" badges.

pub mod buckets;
pub mod clock;
pub mod notifications;
pub mod rules;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use rules::InterestRules;
pub use service::InterestService;
