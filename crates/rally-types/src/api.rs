use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bucket, Decision, UserId};

// -- JWT Claims --

/// Claims of the bearer tokens issued by the phone/OTP login flow.
/// `sub` is the authenticated user's numeric id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub exp: usize,
}

// -- Interests --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendInterestRequest {
    pub receiver_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespondInterestRequest {
    pub decision: Decision,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PendingCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

// -- Notifications --

#[derive(Debug, Serialize, Deserialize)]
pub struct BucketVisitedResponse {
    pub ok: bool,
    pub bucket: Bucket,
    pub last_visit_at: DateTime<Utc>,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}
