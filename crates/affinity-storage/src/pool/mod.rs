//! Connections to the analyzer database.
//!
//! Every write goes through one mutex-guarded connection. A file-backed
//! database also gets a set of query-only readers that WAL keeps unblocked by
//! the writer. An in-memory database is private to its connection, so it has
//! no readers and reads share the writer.

pub mod pragmas;
pub mod read_pool;
pub mod writer;

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use affinity_core::errors::AffinityResult;

pub use read_pool::ReadPool;
pub use writer::Writer;

pub struct ConnectionPool {
    writer: Writer,
    readers: Option<ReadPool>,
    path: Option<PathBuf>,
}

impl ConnectionPool {
    /// The writer is opened first so WAL mode is set before readers attach.
    pub fn open(path: &Path, readers: usize, busy_timeout_ms: u32) -> AffinityResult<Self> {
        let writer = Writer::open(path, busy_timeout_ms)?;
        let readers = ReadPool::open(path, readers, busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers: Some(readers),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory() -> AffinityResult<Self> {
        Ok(Self {
            writer: Writer::in_memory()?,
            readers: None,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Pooled readers. Zero for an in-memory database.
    pub fn reader_count(&self) -> usize {
        self.readers.as_ref().map_or(0, ReadPool::len)
    }

    pub fn write<F, T>(&self, f: F) -> AffinityResult<T>
    where
        F: FnOnce(&Connection) -> AffinityResult<T>,
    {
        self.writer.with_conn(f)
    }

    pub fn read<F, T>(&self, f: F) -> AffinityResult<T>
    where
        F: FnOnce(&Connection) -> AffinityResult<T>,
    {
        match &self.readers {
            Some(readers) => readers.with_conn(f),
            None => self.writer.with_conn(f),
        }
    }
}
