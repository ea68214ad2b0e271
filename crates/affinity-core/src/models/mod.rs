//! Domain models: interaction events, similarity updates, persisted rows,
//! query results, and the wire messages exchanged over the log.

pub mod action;
pub mod interaction;
pub mod messages;
pub mod recommendation;
pub mod similarity;

pub use action::ActionType;
pub use interaction::{InteractionEvent, UserAction};
pub use messages::{SimilarityMessage, UserActionMessage};
pub use recommendation::RecommendedEvent;
pub use similarity::{EventSimilarity, PairKey, SimilarityUpdate};

/// Identifier of a recommendable item (an event in the catalogue).
pub type ItemId = i64;

/// Identifier of a user.
pub type UserId = i64;
