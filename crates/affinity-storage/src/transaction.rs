//! BEGIN IMMEDIATE transactions: the write lock is taken at transaction start,
//! so a batch never fails half-way with SQLITE_BUSY.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use affinity_core::errors::AffinityResult;

use crate::to_storage_err;

/// Run `f` inside a BEGIN IMMEDIATE transaction. Commits on `Ok`, rolls back
/// (on drop) on `Err`.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> AffinityResult<T>
where
    F: FnOnce(&Transaction<'_>) -> AffinityResult<T>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|e| to_storage_err(format!("failed to begin immediate transaction: {e}")))?;

    let result = f(&tx)?;

    tx.commit()
        .map_err(|e| to_storage_err(format!("failed to commit: {e}")))?;
    Ok(result)
}
