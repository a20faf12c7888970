use std::cmp::Reverse;

use rally_types::{InterestBuckets, InterestRecord, InterestStatus, UserId};

/// Split a user's sent and received interests into the four bucket views.
///
/// Accepted and declined merge both directions, so a connection shows up
/// for both sides whoever initiated it. Pending buckets are ordered by
/// `sent_at`, the others by `responded_at`, newest first.
pub fn aggregate(
    user_id: UserId,
    sent: Vec<InterestRecord>,
    received: Vec<InterestRecord>,
) -> InterestBuckets {
    let mut buckets = InterestBuckets::default();

    for record in sent.into_iter().chain(received) {
        match record.status {
            InterestStatus::Pending if record.receiver_id == user_id => {
                buckets.received_pending.push(record)
            }
            InterestStatus::Pending if record.sender_id == user_id => {
                buckets.sent_pending.push(record)
            }
            InterestStatus::Accepted if record.involves(user_id) => buckets.accepted.push(record),
            InterestStatus::Declined if record.involves(user_id) => buckets.declined.push(record),
            _ => {}
        }
    }

    buckets
        .received_pending
        .sort_by_key(|r| Reverse((r.sent_at, r.id)));
    buckets.sent_pending.sort_by_key(|r| Reverse((r.sent_at, r.id)));
    buckets
        .accepted
        .sort_by_key(|r| Reverse((r.responded_at, r.id)));
    buckets
        .declined
        .sort_by_key(|r| Reverse((r.responded_at, r.id)));

    buckets
}
