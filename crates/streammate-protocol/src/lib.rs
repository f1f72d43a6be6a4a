//! Shared vocabulary for Streammate.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Identity** ([`RoomCode`], [`MemberId`], [`ConnectionHandle`],
//!   [`RejoinToken`]): who and where.
//! - **Swipe inputs** ([`ItemId`], [`Direction`], [`ContentCategory`]):
//!   validated and canonicalized at the edge.
//! - **Events** ([`RoomEvent`], [`Recipient`]): what the core emits for
//!   the broadcaster to fan out.
//! - **Responses** ([`CreateRoomResponse`], [`JoinRoomResponse`], ...):
//!   what the core returns to the transport layer.
//!
//! It knows nothing about rooms, locks, or sockets.
//!
//! ```text
//! Transport (out of scope) → Protocol (this crate) → Room / Session / Swipe
//! ```

mod error;
mod event;
mod response;
mod types;

pub use error::ProtocolError;
pub use event::{Dispatch, Recipient, RoomEvent};
pub use response::{
    CreateRoomResponse, JoinRoomResponse, LeaveRoomResponse, MatchView,
    MemberView, RoomStateView, SwipeResponse,
};
pub use types::{
    ConnectionHandle, ContentCategory, DeckRef, Direction, DisplayName,
    ItemId, MemberId, RejoinToken, RoomCode,
};
