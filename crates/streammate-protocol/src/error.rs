//! Error types for the protocol layer.
//!
//! These are validation failures: the input never reached a room, so
//! nothing was mutated.

/// Errors raised while validating client-supplied values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The swipe direction is not one of the recognized spellings.
    #[error("invalid swipe direction: {0:?}")]
    InvalidDirection(String),

    /// A required field was blank, too long, or otherwise malformed.
    ///
    /// The payload names the offending field, e.g. "display name is blank".
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
