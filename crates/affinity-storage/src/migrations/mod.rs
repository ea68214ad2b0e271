//! Versioned schema migrations tracked through `PRAGMA user_version`.

mod v001_user_actions;
mod v002_event_similarities;

use rusqlite::Connection;
use tracing::info;

use affinity_core::errors::{AffinityResult, StorageError};

use crate::to_storage_err;

type Migration = fn(&Connection) -> AffinityResult<()>;

const MIGRATIONS: &[(u32, Migration)] = &[
    (1, v001_user_actions::migrate),
    (2, v002_event_similarities::migrate),
];

/// Latest schema version known to this build.
pub const LATEST_VERSION: u32 = 2;

/// Current schema version of the database.
pub fn current_version(conn: &Connection) -> AffinityResult<u32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every migration newer than the database's version, each in its own
/// transaction together with the version bump.
pub fn run_migrations(conn: &Connection) -> AffinityResult<u32> {
    let mut version = current_version(conn)?;
    for (target, migrate) in MIGRATIONS {
        if *target <= version {
            continue;
        }
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(e.to_string()))?;
        migrate(&tx).map_err(|e| StorageError::MigrationFailed {
            version: *target,
            reason: e.to_string(),
        })?;
        tx.pragma_update(None, "user_version", target)
            .map_err(|e| to_storage_err(e.to_string()))?;
        tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
        info!(version = target, "applied storage migration");
        version = *target;
    }
    Ok(version)
}
