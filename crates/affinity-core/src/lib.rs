//! # affinity-core
//!
//! Foundation crate for the Affinity item-similarity service.
//! Defines the interaction and similarity models, the wire codec, action
//! weights, errors, configuration, and the storage/transport traits.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::{ActionWeights, AffinityConfig};
pub use errors::{AffinityError, AffinityResult};
pub use models::{
    ActionType, EventSimilarity, InteractionEvent, ItemId, PairKey, RecommendedEvent,
    SimilarityUpdate, UserAction, UserId,
};
