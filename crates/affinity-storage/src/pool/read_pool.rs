//! Query-only connections to a file-backed database.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use rusqlite::{Connection, OpenFlags};

use affinity_core::errors::AffinityResult;

use super::pragmas::{configure, Role};
use crate::to_storage_err;

const MAX_READERS: usize = 16;

pub struct ReadPool {
    readers: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    /// `size` is clamped to `1..=16`.
    pub fn open(path: &Path, size: usize, busy_timeout_ms: u32) -> AffinityResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let readers = (0..size.clamp(1, MAX_READERS))
            .map(|_| {
                let conn = Connection::open_with_flags(path, flags)
                    .map_err(|e| to_storage_err(format!("reader for {}: {e}", path.display())))?;
                configure(&conn, Role::Reader, busy_timeout_ms)?;
                Ok(Mutex::new(conn))
            })
            .collect::<AffinityResult<Vec<_>>>()?;
        Ok(Self {
            readers,
            next: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Run `f` on an idle reader, starting the scan at a rotating index.
    /// Waits on the starting reader only when every reader is busy.
    pub fn with_conn<F, T>(&self, f: F) -> AffinityResult<T>
    where
        F: FnOnce(&Connection) -> AffinityResult<T>,
    {
        let start = self.next.fetch_add(1, Ordering::Relaxed);
        let count = self.readers.len();
        for i in 0..count {
            match self.readers[(start + i) % count].try_lock() {
                Ok(conn) => return f(&conn),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => {
                    return Err(to_storage_err("reader mutex poisoned".to_string()))
                }
            }
        }
        let conn = self.readers[start % count]
            .lock()
            .map_err(|_| to_storage_err("reader mutex poisoned".to_string()))?;
        f(&conn)
    }
}
