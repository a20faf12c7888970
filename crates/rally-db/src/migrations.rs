use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (interests, watermarks)");
        conn.execute_batch(
            "
            CREATE TABLE interests (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id       INTEGER NOT NULL,
                receiver_id     INTEGER NOT NULL,
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK (status IN ('pending', 'accepted', 'declined', 'withdrawn')),
                sent_at         INTEGER NOT NULL,
                responded_at    INTEGER,
                CHECK (sender_id <> receiver_id)
            );

            -- At most one non-withdrawn interest per direction
            CREATE UNIQUE INDEX idx_interests_active_pair
                ON interests(sender_id, receiver_id)
                WHERE status <> 'withdrawn';

            CREATE INDEX idx_interests_sender
                ON interests(sender_id, sent_at);

            CREATE INDEX idx_interests_receiver
                ON interests(receiver_id, sent_at);

            CREATE TABLE watermarks (
                user_id         INTEGER NOT NULL,
                bucket          TEXT NOT NULL,
                last_visit_at   INTEGER NOT NULL,
                PRIMARY KEY (user_id, bucket)
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
