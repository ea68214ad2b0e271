//! HTTP surfaces: the collector's ingestion endpoint and the analyzer's
//! query RPC.

pub mod collector;
pub mod error;
pub mod query;

pub use collector::{collector_router, ActionAck, CollectorState};
pub use error::ApiError;
pub use query::{query_router, QueryState};

use axum::body::{Body, Bytes};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub const NDJSON: &str = "application/x-ndjson";

/// Serialize every item up front, then stream one JSON document per line.
/// A serialization failure surfaces before any byte is sent.
pub fn ndjson<T: Serialize>(items: &[T]) -> Result<Response, ApiError> {
    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let mut line = serde_json::to_vec(item).map_err(affinity_core::AffinityError::from)?;
        line.push(b'\n');
        lines.push(Ok::<_, std::io::Error>(Bytes::from(line)));
    }
    let body = Body::from_stream(futures::stream::iter(lines));
    Ok(([(header::CONTENT_TYPE, NDJSON)], body).into_response())
}
