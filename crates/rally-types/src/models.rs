use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user id resolved by the authentication service.
pub type UserId = i64;

pub type InterestId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    Pending,
    Accepted,
    Declined,
    Withdrawn,
}

impl InterestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Every status except `withdrawn` occupies the (sender, receiver) pair.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Withdrawn)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown interest status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for InterestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A receiver's answer to a pending interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Declined,
}

impl From<Decision> for InterestStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Accepted => InterestStatus::Accepted,
            Decision::Declined => InterestStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRecord {
    pub id: InterestId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: InterestStatus,
    pub sent_at: DateTime<Utc>,
    /// Set when the record leaves `pending`.
    pub responded_at: Option<DateTime<Utc>>,
}

impl InterestRecord {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

/// Named views over a user's interests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Received,
    Sent,
    Accepted,
    Declined,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Bucket::Received, Bucket::Sent, Bucket::Accepted, Bucket::Declined];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Only the received and accepted views show a "new" badge in the app.
    pub fn carries_badge(&self) -> bool {
        matches!(self, Self::Received | Self::Accepted)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown bucket: {0}")]
pub struct UnknownBucket(pub String);

impl FromStr for Bucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "sent" => Ok(Self::Sent),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            other => Err(UnknownBucket(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestBuckets {
    pub received_pending: Vec<InterestRecord>,
    pub sent_pending: Vec<InterestRecord>,
    pub accepted: Vec<InterestRecord>,
    pub declined: Vec<InterestRecord>,
}

impl InterestBuckets {
    pub fn get(&self, bucket: Bucket) -> &[InterestRecord] {
        match bucket {
            Bucket::Received => &self.received_pending,
            Bucket::Sent => &self.sent_pending,
            Bucket::Accepted => &self.accepted,
            Bucket::Declined => &self.declined,
        }
    }
}

/// Badge visibility for the buckets that carry one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeState {
    pub received: bool,
    pub accepted: bool,
}
