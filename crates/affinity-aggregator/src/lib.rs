//! # affinity-aggregator
//!
//! Online item-to-item similarity. `SimilarityAggregator` keeps per-item
//! per-user maximum weights, per-item mass, and a lazily filled min-mass
//! cache per pair, and turns each interaction into the similarity updates it
//! causes. `AggregatorWorker` is the only owner of that state; everything
//! else reaches it through an `AggregatorHandle`.

pub mod batch;
pub mod handler;
pub mod state;
pub mod worker;

pub use handler::{replay_committed, AggregationHandler};
pub use state::{AggregatorStats, SimilarityAggregator};
pub use worker::{AggregatorHandle, AggregatorWorker};

/// Normalized min-mass. Zero when either mass is empty.
pub(crate) fn score(min_mass: f64, mass_a: f64, mass_b: f64) -> f64 {
    if mass_a <= 0.0 || mass_b <= 0.0 {
        return 0.0;
    }
    min_mass / (mass_a.sqrt() * mass_b.sqrt())
}
