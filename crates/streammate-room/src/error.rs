//! Error types for the room layer.

use streammate_protocol::{
    ConnectionHandle, DisplayName, MemberId, ProtocolError, RoomCode,
};

use crate::ContentError;

/// Errors that can occur during room operations.
///
/// None of these leave a room half-mutated: every operation validates
/// before it touches state.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// Another current member already uses this display name.
    #[error("display name {0:?} is already taken in room {1}")]
    NameTaken(DisplayName, RoomCode),

    /// The member is not (or no longer) in this room.
    #[error("member {0} not in room {1}")]
    NotMember(MemberId, RoomCode),

    /// Another connected member of the room is already bound to this
    /// connection handle.
    #[error("connection {0} is already bound to a member of room {1}")]
    ConnectionInUse(ConnectionHandle, RoomCode),

    /// Every attempt to draw an unused room code collided.
    #[error("room code space exhausted after {0} attempts")]
    CapacityExceeded(u32),

    /// Client input failed validation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The content provider could not produce a deck.
    #[error(transparent)]
    ContentUnavailable(#[from] ContentError),

    /// The configuration can't produce valid rooms.
    #[error("invalid room configuration: {0}")]
    InvalidConfig(String),

    /// The room's lock was poisoned by a panic mid-operation.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
