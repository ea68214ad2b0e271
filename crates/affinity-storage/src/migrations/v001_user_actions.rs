//! v001: user_actions, one row per (event_id, user_id).

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> AffinityResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user_actions (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id    INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            calc        REAL NOT NULL,
            timestamp   TEXT NOT NULL,
            UNIQUE (event_id, user_id)
        );

        CREATE INDEX IF NOT EXISTS idx_user_actions_user_ts ON user_actions(user_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_user_actions_event ON user_actions(event_id);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
