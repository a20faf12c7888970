pub mod api;
pub mod error;
pub mod models;

pub use error::InterestError;
pub use models::{
    BadgeState, Bucket, Decision, InterestBuckets, InterestId, InterestRecord, InterestStatus,
    UserId,
};
