//! # affinity-analyzer
//!
//! Read side of the system. Two persisters turn the user-actions and
//! similarity topics into idempotent upserts; `RecommendationEngine`
//! answers the three queries against what they stored.

pub mod persister;
pub mod recommend;

pub use persister::{InteractionPersister, SimilarityPersister};
pub use recommend::RecommendationEngine;
