//! Database row types — these map directly to SQLite rows.
//! Timestamps are UTC milliseconds since the epoch.

use chrono::{DateTime, Utc};
use tracing::warn;

use rally_types::{InterestError, InterestRecord, InterestStatus};

pub struct InterestRow {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub status: String,
    pub sent_at: i64,
    pub responded_at: Option<i64>,
}

impl InterestRow {
    pub fn into_record(self) -> Result<InterestRecord, InterestError> {
        let status = self.status.parse::<InterestStatus>().map_err(|e| {
            warn!("Corrupt status on interest {}: {}", self.id, e);
            InterestError::StoreUnavailable(format!("corrupt interest row {}", self.id))
        })?;

        Ok(InterestRecord {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            status,
            sent_at: from_millis(self.sent_at),
            responded_at: self.responded_at.map(from_millis),
        })
    }
}

pub struct WatermarkRow {
    pub bucket: String,
    pub last_visit_at: i64,
}

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_else(|| {
        warn!("Out of range timestamp {}", ms);
        DateTime::default()
    })
}
