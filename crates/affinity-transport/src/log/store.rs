//! The log's single connection. Shared by every producer and consumer of one
//! `MessageLog`; all access is serialized through the mutex.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use affinity_core::errors::AffinityResult;

use super::schema::create_tables;
use crate::disconnected;

pub(crate) struct LogStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    busy_timeout_ms: u32,
}

impl LogStore {
    pub(crate) fn open(path: &Path, busy_timeout_ms: u32) -> AffinityResult<Self> {
        let conn = open_file(path, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
            busy_timeout_ms,
        })
    }

    pub(crate) fn open_in_memory() -> AffinityResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| disconnected(e.to_string()))?;
        create_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
            busy_timeout_ms: 0,
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> AffinityResult<T>
    where
        F: FnOnce(&Connection) -> AffinityResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| disconnected("log connection lock poisoned"))?;
        f(&guard)
    }

    /// Reopen a file-backed log; an in-memory log only re-validates, since
    /// dropping its connection would drop the data.
    pub(crate) fn reconnect(&self) -> AffinityResult<()> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| disconnected("log connection lock poisoned"))?;
        if let Some(path) = &self.path {
            *guard = open_file(path, self.busy_timeout_ms)?;
            info!(path = %path.display(), "message log reconnected");
        }
        guard
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| disconnected(e.to_string()))?;
        Ok(())
    }
}

fn open_file(path: &Path, busy_timeout_ms: u32) -> AffinityResult<Connection> {
    let conn = Connection::open(path).map_err(|e| disconnected(e.to_string()))?;
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = {busy_timeout_ms};
        "
    ))
    .map_err(|e| disconnected(e.to_string()))?;
    create_tables(&conn)?;
    Ok(conn)
}
