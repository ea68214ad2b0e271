//! Free query functions over a borrowed `Connection`.

pub mod similarity_ops;
pub mod user_action_ops;

use chrono::{DateTime, SecondsFormat, Utc};

use affinity_core::errors::{AffinityResult, StorageError};

/// SQLite caps bound parameters per statement; IN-lists are chunked below it.
pub(crate) const IN_CHUNK: usize = 500;

/// `?1, ?2, ..., ?n` starting at `?{first}`.
pub(crate) fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fixed-width RFC 3339 so stored timestamps order lexicographically.
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_ts(column: &str, raw: &str) -> AffinityResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            StorageError::InvalidValue {
                column: column.to_string(),
                value: raw.to_string(),
            }
            .into()
        })
}
