//! Per-connection settings.

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

use crate::to_storage_err;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Reader,
}

pub fn configure(conn: &Connection, role: Role, busy_timeout_ms: u32) -> AffinityResult<()> {
    let sql = match role {
        // journal_mode is persistent in the file, so only the writer sets it.
        Role::Writer => format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {busy_timeout_ms};"
        ),
        Role::Reader => format!(
            "PRAGMA busy_timeout = {busy_timeout_ms};
             PRAGMA query_only = ON;"
        ),
    };
    conn.execute_batch(&sql)
        .map_err(|e| to_storage_err(format!("{role:?} pragmas: {e}")))
}

pub fn journal_mode(conn: &Connection) -> AffinityResult<String> {
    conn.pragma_query_value(None, "journal_mode", |row| row.get::<_, String>(0))
        .map(|mode| mode.to_ascii_lowercase())
        .map_err(|e| to_storage_err(e.to_string()))
}
