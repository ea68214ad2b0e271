//! v002: event_similarities, one row per canonical pair (event_a < event_b).

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> AffinityResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS event_similarities (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            event_a     INTEGER NOT NULL,
            event_b     INTEGER NOT NULL,
            score       REAL NOT NULL,
            timestamp   TEXT NOT NULL,
            UNIQUE (event_a, event_b),
            CHECK (event_a < event_b)
        );

        CREATE INDEX IF NOT EXISTS idx_similarities_b ON event_similarities(event_b);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
