use chrono::{DateTime, Utc};

use rally_types::{Bucket, InterestRecord};

/// Timestamp a bucket's badge compares against the watermark.
pub fn relevant_timestamp(bucket: Bucket, record: &InterestRecord) -> Option<DateTime<Utc>> {
    match bucket {
        Bucket::Received | Bucket::Sent => Some(record.sent_at),
        Bucket::Accepted | Bucket::Declined => record.responded_at,
    }
}

/// Whether `bucket` shows a "new activity" badge given its current contents
/// and the user's last visit.
///
/// A bucket that was never visited (no watermark, or the zero timestamp)
/// badges as soon as it has anything in it. After a visit only records
/// strictly newer than the watermark count. `sent` and `declined` never
/// badge.
pub fn has_new_activity(
    bucket: Bucket,
    records: &[InterestRecord],
    watermark: Option<DateTime<Utc>>,
) -> bool {
    if !bucket.carries_badge() {
        return false;
    }

    match watermark.filter(|mark| mark.timestamp_millis() != 0) {
        None => !records.is_empty(),
        Some(mark) => records
            .iter()
            .filter_map(|r| relevant_timestamp(bucket, r))
            .any(|ts| ts > mark),
    }
}
