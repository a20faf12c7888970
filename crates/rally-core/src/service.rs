use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use rally_db::{Database, StoreResult};
use rally_types::{
    BadgeState, Bucket, Decision, InterestBuckets, InterestError, InterestId, InterestRecord,
    InterestStatus, UserId,
};

use crate::buckets;
use crate::clock::Clock;
use crate::notifications::has_new_activity;
use crate::rules::InterestRules;

/// Business rules for interests. Every call reads the store fresh; nothing
/// about a record is cached between requests.
pub struct InterestService {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    rules: InterestRules,
}

impl InterestService {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, rules: InterestRules) -> Self {
        Self { db, clock, rules }
    }

    pub fn rules(&self) -> InterestRules {
        self.rules
    }

    pub fn send_interest(&self, sender_id: UserId, receiver_id: UserId) -> StoreResult<InterestRecord> {
        if sender_id == receiver_id {
            return Err(InterestError::InvalidSelfInterest);
        }

        let now = self.clock.now();
        let record = self.db.create_interest_within_limit(
            sender_id,
            receiver_id,
            now,
            self.rules.daily_limit,
            now - self.rules.window,
        )?;
        info!("Interest {} sent: {} -> {}", record.id, sender_id, receiver_id);
        Ok(record)
    }

    pub fn respond_to_interest(
        &self,
        receiver_id: UserId,
        interest_id: InterestId,
        decision: Decision,
    ) -> StoreResult<InterestRecord> {
        let status = InterestStatus::from(decision);
        let record = self
            .db
            .update_interest_status(interest_id, status, receiver_id, self.clock.now())?;
        info!("Interest {} {} by {}", record.id, record.status, receiver_id);
        Ok(record)
    }

    /// Withdrawing frees the (sender, receiver) pair for a new interest.
    pub fn withdraw_interest(&self, sender_id: UserId, interest_id: InterestId) -> StoreResult<InterestRecord> {
        let record = self.db.update_interest_status(
            interest_id,
            InterestStatus::Withdrawn,
            sender_id,
            self.clock.now(),
        )?;
        info!("Interest {} withdrawn by {}", record.id, sender_id);
        Ok(record)
    }

    pub fn get_buckets(&self, user_id: UserId) -> StoreResult<InterestBuckets> {
        let sent = self.db.list_interests_by_sender(user_id)?;
        let received = self.db.list_interests_by_receiver(user_id)?;
        Ok(buckets::aggregate(user_id, sent, received))
    }

    /// Size of the received-pending bucket.
    pub fn pending_count(&self, user_id: UserId) -> StoreResult<u64> {
        self.db.count_pending_received(user_id)
    }

    /// The interest that currently describes how `viewer` and `other` relate,
    /// if they have ever exchanged one.
    pub fn relationship(&self, viewer: UserId, other: UserId) -> StoreResult<Option<InterestRecord>> {
        if viewer == other {
            return Ok(None);
        }
        self.db.latest_interest_between(viewer, other)
    }

    pub fn has_new_activity(&self, user_id: UserId, bucket: Bucket) -> StoreResult<bool> {
        if !bucket.carries_badge() {
            return Ok(false);
        }
        let buckets = self.get_buckets(user_id)?;
        let watermark = self.db.get_watermark(user_id, bucket)?;
        Ok(has_new_activity(bucket, buckets.get(bucket), watermark))
    }

    pub fn badges(&self, user_id: UserId) -> StoreResult<BadgeState> {
        let buckets = self.get_buckets(user_id)?;
        let watermarks = self.db.list_watermarks(user_id)?;
        let watermark_for = |bucket: Bucket| {
            watermarks
                .iter()
                .find(|(b, _)| *b == bucket)
                .map(|(_, at)| *at)
        };

        Ok(BadgeState {
            received: has_new_activity(
                Bucket::Received,
                buckets.get(Bucket::Received),
                watermark_for(Bucket::Received),
            ),
            accepted: has_new_activity(
                Bucket::Accepted,
                buckets.get(Bucket::Accepted),
                watermark_for(Bucket::Accepted),
            ),
        })
    }

    /// Clears the badge for everything currently in `bucket`. Records that
    /// arrive later still badge.
    pub fn mark_bucket_visited(&self, user_id: UserId, bucket: Bucket) -> StoreResult<DateTime<Utc>> {
        self.db.set_watermark(user_id, bucket, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Duration;

    const A: UserId = 1;
    const B: UserId = 2;
    const C: UserId = 3;

    struct Harness {
        clock: Arc<ManualClock>,
        service: InterestService,
    }

    fn harness() -> Harness {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_750_000_000, 0).unwrap(),
        ));
        let service = InterestService::new(db, clock.clone(), InterestRules::default());
        Harness { clock, service }
    }

    #[test]
    fn test_self_interest() {
        let h = harness();
        assert_eq!(
            h.service.send_interest(A, A).unwrap_err(),
            InterestError::InvalidSelfInterest
        );
    }

    #[test]
    fn test_duplicate_until_withdrawn() {
        let h = harness();
        let first = h.service.send_interest(A, B).unwrap();
        assert_eq!(first.status, InterestStatus::Pending);
        assert_eq!(
            h.service.send_interest(A, B).unwrap_err(),
            InterestError::DuplicateActiveInterest
        );

        h.service.withdraw_interest(A, first.id).unwrap();
        let second = h.service.send_interest(A, B).unwrap();
        assert_ne!(second.id, first.id);
    }

    #[test]
    fn test_accepted_and_declined_keep_pair_taken() {
        let h = harness();
        let ab = h.service.send_interest(A, B).unwrap();
        h.service.respond_to_interest(B, ab.id, Decision::Accepted).unwrap();
        assert_eq!(
            h.service.send_interest(A, B).unwrap_err(),
            InterestError::DuplicateActiveInterest
        );

        let ac = h.service.send_interest(A, C).unwrap();
        h.service.respond_to_interest(C, ac.id, Decision::Declined).unwrap();
        assert_eq!(
            h.service.send_interest(A, C).unwrap_err(),
            InterestError::DuplicateActiveInterest
        );
    }

    #[test]
    fn test_daily_limit_and_window_aging() {
        let h = harness();
        for receiver in 100..110 {
            h.service.send_interest(A, receiver).unwrap();
            h.clock.advance(Duration::minutes(5));
        }
        assert_eq!(
            h.service.send_interest(A, 110).unwrap_err(),
            InterestError::RateLimitExceeded { limit: 10 }
        );
        // Other senders are unaffected
        h.service.send_interest(B, 110).unwrap();

        // First send was at t0; 24h after it one slot frees up
        h.clock.set(DateTime::from_timestamp(1_750_000_000, 0).unwrap() + Duration::hours(24));
        assert_eq!(
            h.service.send_interest(A, 110).unwrap_err(),
            InterestError::RateLimitExceeded { limit: 10 }
        );
        h.clock.advance(Duration::milliseconds(1));
        h.service.send_interest(A, 110).unwrap();
        assert!(h.service.send_interest(A, 111).is_err());
    }

    #[test]
    fn test_withdrawn_interests_still_consume_quota() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(0, 0).unwrap()));
        let service = InterestService::new(db, clock, InterestRules::with_daily_limit(2));

        let first = service.send_interest(A, B).unwrap();
        service.withdraw_interest(A, first.id).unwrap();
        service.send_interest(A, B).unwrap();
        assert_eq!(
            service.send_interest(A, C).unwrap_err(),
            InterestError::RateLimitExceeded { limit: 2 }
        );
    }

    #[test]
    fn test_concurrent_sends_stay_within_daily_limit() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(DateTime::from_timestamp(0, 0).unwrap()));
        let service = Arc::new(InterestService::new(db, clock, InterestRules::with_daily_limit(3)));

        let handles: Vec<_> = (100..108)
            .map(|receiver| {
                let service = service.clone();
                std::thread::spawn(move || service.send_interest(A, receiver))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == InterestError::RateLimitExceeded { limit: 3 }));
    }

    #[test]
    fn test_respond_rules() {
        let h = harness();
        let rec = h.service.send_interest(A, B).unwrap();

        assert_eq!(
            h.service.respond_to_interest(C, rec.id, Decision::Accepted).unwrap_err(),
            InterestError::Forbidden
        );
        assert_eq!(
            h.service.respond_to_interest(A, rec.id, Decision::Accepted).unwrap_err(),
            InterestError::Forbidden
        );
        assert_eq!(
            h.service.respond_to_interest(B, 404, Decision::Accepted).unwrap_err(),
            InterestError::NotFound(404)
        );

        h.clock.advance(Duration::minutes(1));
        let declined = h.service.respond_to_interest(B, rec.id, Decision::Declined).unwrap();
        assert_eq!(declined.status, InterestStatus::Declined);
        assert_eq!(declined.responded_at, Some(h.clock.now()));

        assert_eq!(
            h.service.respond_to_interest(B, rec.id, Decision::Accepted).unwrap_err(),
            InterestError::InvalidTransition { from: InterestStatus::Declined }
        );
    }

    #[test]
    fn test_withdraw_rules() {
        let h = harness();
        let rec = h.service.send_interest(A, B).unwrap();

        assert_eq!(
            h.service.withdraw_interest(B, rec.id).unwrap_err(),
            InterestError::Forbidden
        );
        let withdrawn = h.service.withdraw_interest(A, rec.id).unwrap();
        assert_eq!(withdrawn.status, InterestStatus::Withdrawn);
        assert!(withdrawn.responded_at.is_some());
        assert_eq!(
            h.service.withdraw_interest(A, rec.id).unwrap_err(),
            InterestError::InvalidTransition { from: InterestStatus::Withdrawn }
        );
        // A withdrawn interest cannot be answered either
        assert_eq!(
            h.service.respond_to_interest(B, rec.id, Decision::Accepted).unwrap_err(),
            InterestError::InvalidTransition { from: InterestStatus::Withdrawn }
        );
    }

    #[test]
    fn test_accept_shows_in_both_buckets() {
        let h = harness();
        let rec = h.service.send_interest(A, B).unwrap();
        assert_eq!(rec.id, 1);

        let b_view = h.service.get_buckets(B).unwrap();
        assert_eq!(b_view.received_pending, vec![rec.clone()]);
        assert_eq!(h.service.get_buckets(A).unwrap().sent_pending, vec![rec.clone()]);
        assert_eq!(h.service.pending_count(B).unwrap(), 1);

        h.service.respond_to_interest(B, rec.id, Decision::Accepted).unwrap();

        for user in [A, B] {
            let view = h.service.get_buckets(user).unwrap();
            assert_eq!(view.accepted.len(), 1);
            assert_eq!(view.accepted[0].id, rec.id);
            assert!(view.received_pending.is_empty());
            assert!(view.sent_pending.is_empty());
        }
        assert_eq!(h.service.pending_count(B).unwrap(), 0);
    }

    #[test]
    fn test_badges_follow_visits() {
        let h = harness();
        assert_eq!(h.service.badges(B).unwrap(), BadgeState::default());

        let rec = h.service.send_interest(A, B).unwrap();
        assert!(h.service.badges(B).unwrap().received);
        assert!(!h.service.badges(A).unwrap().received);

        h.clock.advance(Duration::seconds(10));
        h.service.mark_bucket_visited(B, Bucket::Received).unwrap();
        assert!(!h.service.badges(B).unwrap().received);
        // Idempotent
        h.service.mark_bucket_visited(B, Bucket::Received).unwrap();
        assert!(!h.service.has_new_activity(B, Bucket::Received).unwrap());

        h.clock.advance(Duration::seconds(10));
        h.service.send_interest(C, B).unwrap();
        assert!(h.service.badges(B).unwrap().received);

        // Acceptance badges the sender's accepted bucket
        h.clock.advance(Duration::seconds(10));
        h.service.respond_to_interest(B, rec.id, Decision::Accepted).unwrap();
        assert!(h.service.badges(A).unwrap().accepted);
        h.service.mark_bucket_visited(A, Bucket::Accepted).unwrap();
        assert!(!h.service.badges(A).unwrap().accepted);

        assert!(!h.service.has_new_activity(A, Bucket::Sent).unwrap());
    }

    #[test]
    fn test_relationship() {
        let h = harness();
        assert!(h.service.relationship(A, B).unwrap().is_none());
        assert!(h.service.relationship(A, A).unwrap().is_none());

        let rec = h.service.send_interest(B, A).unwrap();
        assert_eq!(h.service.relationship(A, B).unwrap(), Some(rec.clone()));
        assert_eq!(h.service.relationship(B, A).unwrap(), Some(rec));
    }
}
