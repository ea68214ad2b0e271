use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

use super::pragmas::{configure, Role};
use crate::to_storage_err;

/// The one connection allowed to write. Callers queue on the mutex.
pub struct Writer {
    conn: Mutex<Connection>,
}

impl Writer {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> AffinityResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| to_storage_err(format!("cannot open {}: {e}", path.display())))?;
        configure(&conn, Role::Writer, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> AffinityResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> AffinityResult<T>
    where
        F: FnOnce(&Connection) -> AffinityResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("writer mutex poisoned".to_string()))?;
        f(&conn)
    }
}
