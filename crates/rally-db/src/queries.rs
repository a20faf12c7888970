use crate::models::{InterestRow, WatermarkRow, from_millis, to_millis};
use crate::{Database, StoreResult, unavailable};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use rally_types::{Bucket, InterestError, InterestId, InterestRecord, InterestStatus, UserId};

const INTEREST_COLUMNS: &str = "id, sender_id, receiver_id, status, sent_at, responded_at";

impl Database {
    // -- Interests --

    /// Insert a new `pending` interest. The active-pair check and the insert
    /// run in one transaction, and the partial unique index backs it up.
    pub fn create_interest(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        sent_at: DateTime<Utc>,
    ) -> StoreResult<InterestRecord> {
        if sender_id == receiver_id {
            return Err(InterestError::InvalidSelfInterest);
        }

        self.with_tx(|tx| insert_pending(tx, sender_id, receiver_id, sent_at))
    }

    /// Like `create_interest`, but first counts the sender's interests sent at
    /// or after `since` in the same transaction, and refuses once that count
    /// reaches `limit`.
    pub fn create_interest_within_limit(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        sent_at: DateTime<Utc>,
        limit: u32,
        since: DateTime<Utc>,
    ) -> StoreResult<InterestRecord> {
        if sender_id == receiver_id {
            return Err(InterestError::InvalidSelfInterest);
        }

        self.with_tx(|tx| {
            let recent = count_sent_since(tx, sender_id, since)?;
            if recent >= limit {
                warn!("User {} hit the daily interest limit ({})", sender_id, limit);
                return Err(InterestError::RateLimitExceeded { limit });
            }

            insert_pending(tx, sender_id, receiver_id, sent_at)
        })
    }

    pub fn get_interest(&self, id: InterestId) -> StoreResult<Option<InterestRecord>> {
        self.with_conn(|conn| query_interest(conn, id))
    }

    /// Move a `pending` interest to `new_status` on behalf of `acting_user_id`.
    /// The receiver may accept or decline; the sender may withdraw.
    pub fn update_interest_status(
        &self,
        id: InterestId,
        new_status: InterestStatus,
        acting_user_id: UserId,
        responded_at: DateTime<Utc>,
    ) -> StoreResult<InterestRecord> {
        let responded_ms = to_millis(responded_at);

        self.with_tx(|tx| {
            let mut record = query_interest(tx, id)?.ok_or(InterestError::NotFound(id))?;

            let authorized_party = match new_status {
                InterestStatus::Accepted | InterestStatus::Declined => record.receiver_id,
                InterestStatus::Withdrawn => record.sender_id,
                InterestStatus::Pending => {
                    return Err(InterestError::InvalidTransition { from: record.status });
                }
            };

            if acting_user_id != authorized_party {
                return Err(InterestError::Forbidden);
            }

            if record.status != InterestStatus::Pending {
                return Err(InterestError::InvalidTransition { from: record.status });
            }

            let changed = tx
                .execute(
                    "UPDATE interests SET status = ?1, responded_at = ?2
                     WHERE id = ?3 AND status = 'pending'",
                    rusqlite::params![new_status.as_str(), responded_ms, id],
                )
                .map_err(unavailable)?;

            if changed == 0 {
                return Err(InterestError::InvalidTransition { from: record.status });
            }

            record.status = new_status;
            record.responded_at = Some(from_millis(responded_ms));
            Ok(record)
        })
    }

    /// Every interest `user_id` sent, newest first.
    pub fn list_interests_by_sender(&self, user_id: UserId) -> StoreResult<Vec<InterestRecord>> {
        self.with_conn(|conn| query_interests(conn, "sender_id = ?1", user_id))
    }

    /// Every interest `user_id` received, newest first.
    pub fn list_interests_by_receiver(&self, user_id: UserId) -> StoreResult<Vec<InterestRecord>> {
        self.with_conn(|conn| query_interests(conn, "receiver_id = ?1", user_id))
    }

    /// Interests created by `user_id` at or after `since`, whatever their status.
    pub fn count_recent_by_sender(&self, user_id: UserId, since: DateTime<Utc>) -> StoreResult<u32> {
        self.with_conn(|conn| count_sent_since(conn, user_id, since))
    }

    pub fn count_pending_received(&self, user_id: UserId) -> StoreResult<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM interests WHERE receiver_id = ?1 AND status = 'pending'",
                    [user_id],
                    |row| row.get(0),
                )
                .map_err(unavailable)?;
            Ok(count as u64)
        })
    }

    /// The most relevant interest between two users in either direction:
    /// the newest active one, else the newest withdrawn one.
    pub fn latest_interest_between(&self, a: UserId, b: UserId) -> StoreResult<Option<InterestRecord>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {INTEREST_COLUMNS} FROM interests
                 WHERE (sender_id = ?1 AND receiver_id = ?2)
                    OR (sender_id = ?2 AND receiver_id = ?1)
                 ORDER BY status = 'withdrawn', sent_at DESC, id DESC
                 LIMIT 1"
            );
            let row = conn
                .query_row(&sql, rusqlite::params![a, b], read_interest_row)
                .optional()
                .map_err(unavailable)?;
            row.map(InterestRow::into_record).transpose()
        })
    }

    // -- Watermarks --

    pub fn get_watermark(&self, user_id: UserId, bucket: Bucket) -> StoreResult<Option<DateTime<Utc>>> {
        self.with_conn(|conn| {
            let ms: Option<i64> = conn
                .query_row(
                    "SELECT last_visit_at FROM watermarks WHERE user_id = ?1 AND bucket = ?2",
                    rusqlite::params![user_id, bucket.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(unavailable)?;
            Ok(ms.map(from_millis))
        })
    }

    /// Record a visit. The stored watermark never moves backwards, so
    /// repeated or reordered calls are harmless. Returns the stored value.
    pub fn set_watermark(
        &self,
        user_id: UserId,
        bucket: Bucket,
        at: DateTime<Utc>,
    ) -> StoreResult<DateTime<Utc>> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO watermarks (user_id, bucket, last_visit_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, bucket)
                 DO UPDATE SET last_visit_at = MAX(last_visit_at, excluded.last_visit_at)",
                rusqlite::params![user_id, bucket.as_str(), to_millis(at)],
            )
            .map_err(unavailable)?;

            let ms: i64 = tx
                .query_row(
                    "SELECT last_visit_at FROM watermarks WHERE user_id = ?1 AND bucket = ?2",
                    rusqlite::params![user_id, bucket.as_str()],
                    |row| row.get(0),
                )
                .map_err(unavailable)?;
            Ok(from_millis(ms))
        })
    }

    pub fn list_watermarks(&self, user_id: UserId) -> StoreResult<Vec<(Bucket, DateTime<Utc>)>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT bucket, last_visit_at FROM watermarks WHERE user_id = ?1")
                .map_err(unavailable)?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(WatermarkRow {
                        bucket: row.get(0)?,
                        last_visit_at: row.get(1)?,
                    })
                })
                .map_err(unavailable)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(unavailable)?;

            Ok(rows
                .into_iter()
                .filter_map(|row| match row.bucket.parse::<Bucket>() {
                    Ok(bucket) => Some((bucket, from_millis(row.last_visit_at))),
                    Err(e) => {
                        warn!("Skipping watermark for user {}: {}", user_id, e);
                        None
                    }
                })
                .collect())
        })
    }
}

fn insert_pending(
    conn: &Connection,
    sender_id: UserId,
    receiver_id: UserId,
    sent_at: DateTime<Utc>,
) -> StoreResult<InterestRecord> {
    let sent_ms = to_millis(sent_at);

    let active: Option<i64> = conn
        .query_row(
            "SELECT id FROM interests
             WHERE sender_id = ?1 AND receiver_id = ?2 AND status <> 'withdrawn'",
            rusqlite::params![sender_id, receiver_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(unavailable)?;

    if let Some(existing) = active {
        debug!("Interest {} already active for {} -> {}", existing, sender_id, receiver_id);
        return Err(InterestError::DuplicateActiveInterest);
    }

    conn.execute(
        "INSERT INTO interests (sender_id, receiver_id, status, sent_at)
         VALUES (?1, ?2, 'pending', ?3)",
        rusqlite::params![sender_id, receiver_id, sent_ms],
    )
    .map_err(map_insert_err)?;

    Ok(InterestRecord {
        id: conn.last_insert_rowid(),
        sender_id,
        receiver_id,
        status: InterestStatus::Pending,
        sent_at: from_millis(sent_ms),
        responded_at: None,
    })
}

fn count_sent_since(conn: &Connection, user_id: UserId, since: DateTime<Utc>) -> StoreResult<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM interests WHERE sender_id = ?1 AND sent_at >= ?2",
        rusqlite::params![user_id, to_millis(since)],
        |row| row.get(0),
    )
    .map_err(unavailable)
}

fn read_interest_row(row: &Row<'_>) -> rusqlite::Result<InterestRow> {
    Ok(InterestRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        status: row.get(3)?,
        sent_at: row.get(4)?,
        responded_at: row.get(5)?,
    })
}

fn query_interest(conn: &Connection, id: InterestId) -> StoreResult<Option<InterestRecord>> {
    let sql = format!("SELECT {INTEREST_COLUMNS} FROM interests WHERE id = ?1");
    let row = conn
        .query_row(&sql, [id], read_interest_row)
        .optional()
        .map_err(unavailable)?;
    row.map(InterestRow::into_record).transpose()
}

fn query_interests(conn: &Connection, filter: &str, user_id: UserId) -> StoreResult<Vec<InterestRecord>> {
    let sql = format!(
        "SELECT {INTEREST_COLUMNS} FROM interests WHERE {filter} ORDER BY sent_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql).map_err(unavailable)?;

    let rows = stmt
        .query_map([user_id], read_interest_row)
        .map_err(unavailable)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(unavailable)?;

    rows.into_iter().map(InterestRow::into_record).collect()
}

/// A unique-index hit on insert means another request created the same
/// active pair first.
fn map_insert_err(e: rusqlite::Error) -> InterestError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            InterestError::DuplicateActiveInterest
        }
        _ => unavailable(e),
    }
}
