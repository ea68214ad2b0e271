//! event_similarities queries: last-write-wins upsert and neighbor lookups.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use affinity_core::errors::{AffinityResult, EventError};
use affinity_core::models::{EventSimilarity, ItemId, PairKey};
use affinity_core::traits::UpsertOutcome;

use super::{format_ts, parse_ts, placeholders, IN_CHUNK};
use crate::to_storage_err;

/// Replace the stored score for the pair. Rows must already be canonical.
pub fn upsert_similarity(
    conn: &Connection,
    row: &EventSimilarity,
) -> AffinityResult<UpsertOutcome> {
    if row.event_a >= row.event_b {
        return Err(EventError::NonCanonicalPair {
            event_a: row.event_a,
            event_b: row.event_b,
        }
        .into());
    }

    let existing: Option<(f64, String)> = conn
        .query_row(
            "SELECT score, timestamp FROM event_similarities
             WHERE event_a = ?1 AND event_b = ?2",
            params![row.event_a, row.event_b],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let ts = format_ts(&row.timestamp);
    match existing {
        None => {
            conn.execute(
                "INSERT INTO event_similarities (event_a, event_b, score, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
                params![row.event_a, row.event_b, row.score, ts],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(UpsertOutcome::Inserted)
        }
        Some((score, stored_ts)) if score == row.score && stored_ts == ts => {
            Ok(UpsertOutcome::Unchanged)
        }
        Some(_) => {
            conn.execute(
                "UPDATE event_similarities SET score = ?3, timestamp = ?4
                 WHERE event_a = ?1 AND event_b = ?2",
                params![row.event_a, row.event_b, row.score, ts],
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            Ok(UpsertOutcome::Updated)
        }
    }
}

pub fn get_similarity(
    conn: &Connection,
    a: ItemId,
    b: ItemId,
) -> AffinityResult<Option<EventSimilarity>> {
    let key = PairKey::new(a, b);
    let raw = conn
        .query_row(
            "SELECT event_a, event_b, score, timestamp FROM event_similarities
             WHERE event_a = ?1 AND event_b = ?2",
            params![key.lo, key.hi],
            raw_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    raw.map(into_similarity).transpose()
}

/// Rows with `item` in either column, highest score first.
pub fn similarities_for(conn: &Connection, item: ItemId) -> AffinityResult<Vec<EventSimilarity>> {
    similarities_touching(conn, &[item])
}

/// Rows with any of `items` in either column, each row once, highest score
/// first with ties in pair order.
pub fn similarities_touching(
    conn: &Connection,
    items: &[ItemId],
) -> AffinityResult<Vec<EventSimilarity>> {
    let mut ids: Vec<ItemId> = items.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let mut rows = Vec::new();
    for chunk in ids.chunks(IN_CHUNK) {
        let list = placeholders(1, chunk.len());
        let sql = format!(
            "SELECT event_a, event_b, score, timestamp FROM event_similarities
             WHERE event_a IN ({list}) OR event_b IN ({list})"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| to_storage_err(e.to_string()))?;
        let mapped = stmt
            .query_map(params_from_iter(chunk.iter()), raw_row)
            .map_err(|e| to_storage_err(e.to_string()))?;
        for raw in mapped {
            let raw = raw.map_err(|e| to_storage_err(e.to_string()))?;
            rows.push(into_similarity(raw)?);
        }
    }

    // A row can match two chunks.
    rows.sort_by(|x, y| (x.event_a, x.event_b).cmp(&(y.event_a, y.event_b)));
    rows.dedup_by(|x, y| x.event_a == y.event_a && x.event_b == y.event_b);
    rows.sort_by(|x, y| y.score.total_cmp(&x.score));
    Ok(rows)
}

pub fn count_similarities(conn: &Connection) -> AffinityResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM event_similarities", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n.max(0) as u64)
    .map_err(|e| to_storage_err(e.to_string()))
}

type RawSimilarity = (i64, i64, f64, String);

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSimilarity> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_similarity((event_a, event_b, score, ts): RawSimilarity) -> AffinityResult<EventSimilarity> {
    Ok(EventSimilarity {
        event_a,
        event_b,
        score,
        timestamp: parse_ts("event_similarities.timestamp", &ts)?,
    })
}
