//! Unified error type for Streammate.

use streammate_protocol::ProtocolError;
use streammate_room::RoomError;

/// Top-level error that wraps all crate-specific errors.
///
/// Input that fails to parse at the facade surfaces as `Protocol`;
/// everything decided inside a room surfaces as `Room`.
#[derive(Debug, thiserror::Error)]
pub enum StreammateError {
    /// Malformed input: blank name or code, unknown direction, bad item id.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (not found, name taken, not a member, ...).
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl StreammateError {
    /// Returns `true` for errors caused by the caller's input rather than
    /// room state, whichever layer caught them.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_)
                | Self::Room(RoomError::Protocol(_))
                | Self::Room(RoomError::ConnectionInUse(..))
        )
    }
}
