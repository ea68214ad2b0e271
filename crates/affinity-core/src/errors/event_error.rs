/// Errors raised while decoding inbound messages.
/// Never fatal: the offending record is dropped and logged.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown action type: {action_type}")]
    UnknownActionType { action_type: String },

    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("similarity pair not canonical: eventA={event_a} must be < eventB={event_b}")]
    NonCanonicalPair { event_a: i64, event_b: i64 },
}
