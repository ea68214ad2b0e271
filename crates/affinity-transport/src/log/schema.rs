//! Log tables. Created idempotently on every open.

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

use crate::disconnected;

pub(crate) fn create_tables(conn: &Connection) -> AffinityResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS log_topics (
            topic       TEXT PRIMARY KEY,
            partitions  INTEGER NOT NULL CHECK (partitions > 0)
        );

        CREATE TABLE IF NOT EXISTS log_records (
            topic         TEXT NOT NULL,
            partition_id  INTEGER NOT NULL,
            log_offset    INTEGER NOT NULL,
            record_key    INTEGER NOT NULL,
            payload       TEXT NOT NULL,
            appended_at   INTEGER NOT NULL,
            PRIMARY KEY (topic, partition_id, log_offset)
        ) WITHOUT ROWID;

        CREATE TABLE IF NOT EXISTS log_commits (
            group_id      TEXT NOT NULL,
            topic         TEXT NOT NULL,
            partition_id  INTEGER NOT NULL,
            next_offset   INTEGER NOT NULL,
            committed_at  INTEGER NOT NULL,
            PRIMARY KEY (group_id, topic, partition_id)
        ) WITHOUT ROWID;
        ",
    )
    .map_err(|e| disconnected(format!("failed to create log tables: {e}")))
}
