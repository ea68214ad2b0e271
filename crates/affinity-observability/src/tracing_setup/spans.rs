//! Span definitions for the three hot paths.

/// Span around one aggregation batch.
#[macro_export]
macro_rules! aggregation_span {
    ($events:expr) => {
        tracing::info_span!(
            $crate::tracing_setup::spans::names::AGGREGATION,
            events = $events
        )
    };
}

/// Span around one persistence batch; `$table` names the target table.
#[macro_export]
macro_rules! persist_span {
    ($table:expr, $rows:expr) => {
        tracing::info_span!(
            $crate::tracing_setup::spans::names::PERSIST,
            table = %$table, rows = $rows
        )
    };
}

/// Span around one recommendation query.
#[macro_export]
macro_rules! query_span {
    ($kind:expr, $subject:expr) => {
        tracing::info_span!(
            $crate::tracing_setup::spans::names::QUERY,
            kind = %$kind, subject = $subject
        )
    };
}

/// Span names, for filters and assertions.
pub mod names {
    pub const AGGREGATION: &str = "affinity.aggregation";
    pub const PERSIST: &str = "affinity.persist";
    pub const QUERY: &str = "affinity.query";
}
