//! user_actions queries: max-merge upsert and the analyzer's read paths.

use std::collections::{HashMap, HashSet};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use affinity_core::errors::AffinityResult;
use affinity_core::models::{ItemId, UserAction, UserId};
use affinity_core::traits::UpsertOutcome;

use super::{format_ts, parse_ts, placeholders, IN_CHUNK};
use crate::to_storage_err;

/// Insert the row, or raise `calc` and bump `timestamp` when the incoming
/// weight is strictly larger. Lower or equal weights leave the row untouched.
pub fn upsert_user_action(conn: &Connection, action: &UserAction) -> AffinityResult<UpsertOutcome> {
    let existing: Option<f64> = conn
        .query_row(
            "SELECT calc FROM user_actions WHERE event_id = ?1 AND user_id = ?2",
            params![action.event_id, action.user_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    match existing {
        None => {
            conn.execute(
                "INSERT INTO user_actions (event_id, user_id, calc, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    action.event_id,
                    action.user_id,
                    action.calc,
                    format_ts(&action.timestamp)
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(UpsertOutcome::Inserted)
        }
        Some(calc) if action.calc > calc => {
            conn.execute(
                "UPDATE user_actions SET calc = ?3, timestamp = ?4
                 WHERE event_id = ?1 AND user_id = ?2",
                params![
                    action.event_id,
                    action.user_id,
                    action.calc,
                    format_ts(&action.timestamp)
                ],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(UpsertOutcome::Updated)
        }
        Some(_) => Ok(UpsertOutcome::Unchanged),
    }
}

pub fn get_user_action(
    conn: &Connection,
    event_id: ItemId,
    user_id: UserId,
) -> AffinityResult<Option<UserAction>> {
    let row = conn
        .query_row(
            "SELECT event_id, user_id, calc, timestamp FROM user_actions
             WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, user_id],
            raw_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(into_action).transpose()
}

/// Newest first; ties broken by event id so the order is stable.
pub fn recent_user_actions(
    conn: &Connection,
    user_id: UserId,
    limit: usize,
) -> AffinityResult<Vec<UserAction>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare_cached(
            "SELECT event_id, user_id, calc, timestamp FROM user_actions
             WHERE user_id = ?1
             ORDER BY timestamp DESC, event_id ASC
             LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![user_id, limit], raw_row)
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut actions = Vec::new();
    for row in rows {
        let raw = row.map_err(|e| to_storage_err(e.to_string()))?;
        actions.push(into_action(raw)?);
    }
    Ok(actions)
}

pub fn interacted_items(conn: &Connection, user_id: UserId) -> AffinityResult<HashSet<ItemId>> {
    let mut stmt = conn
        .prepare_cached("SELECT event_id FROM user_actions WHERE user_id = ?1")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id], |row| row.get::<_, i64>(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.collect::<Result<HashSet<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))
}

/// `Σ calc` per requested item. Items with no rows are absent from the map.
pub fn interaction_sums(
    conn: &Connection,
    event_ids: &[ItemId],
) -> AffinityResult<HashMap<ItemId, f64>> {
    let mut ids: Vec<ItemId> = event_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut sums = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(IN_CHUNK) {
        let sql = format!(
            "SELECT event_id, SUM(calc) FROM user_actions
             WHERE event_id IN ({})
             GROUP BY event_id",
            placeholders(1, chunk.len())
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let rows = stmt
            .query_map(params_from_iter(chunk.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, f64>(1)?))
            })
            .map_err(|e| to_storage_err(e.to_string()))?;
        for row in rows {
            let (id, sum) = row.map_err(|e| to_storage_err(e.to_string()))?;
            sums.insert(id, sum);
        }
    }
    Ok(sums)
}

pub fn count_user_actions(conn: &Connection) -> AffinityResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM user_actions", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n.max(0) as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}

type RawAction = (i64, i64, f64, String);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAction> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_action((event_id, user_id, calc, ts): RawAction) -> AffinityResult<UserAction> {
    Ok(UserAction {
        event_id,
        user_id,
        calc,
        timestamp: parse_ts("user_actions.timestamp", &ts)?,
    })
}
