//! # Streammate
//!
//! Group swipe-to-pick for watch parties.
//!
//! A handful of people join a short-lived room by code, each swipe accept
//! or reject through the same deck of titles, and the moment every
//! current member has accepted the same item, everyone is told it's a
//! match.
//!
//! This crate is the facade over the layers:
//!
//! ```text
//! Streammate (this crate)   ← raw input in, responses and events out
//!     ↕
//! streammate-session        ← create / join / reconnect / leave / disconnect
//! streammate-swipe          ← swipe log and consensus
//!     ↕
//! streammate-room           ← Room aggregate, registry, per-room locks
//!     ↕
//! streammate-protocol       ← ids, events, response shapes
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use streammate::prelude::*;
//!
//! # fn main() -> Result<(), StreammateError> {
//! let content = StaticContentProvider::new().with_category(
//!     ContentCategory::parse("movies")?,
//!     (1..=50u64).map(ItemId::from),
//! );
//! let app = Streammate::builder().content(Arc::new(content)).build()?;
//!
//! let room = app.create_room("alice", "movies", ConnectionHandle::new(1))?;
//! let bob = app.join_room(room.room_code.as_str(), "bob", ConnectionHandle::new(2), None)?;
//!
//! app.record_swipe(room.room_code.as_str(), room.member_id, ItemId::from(7u64), "accept")?;
//! let swipe = app.record_swipe(room.room_code.as_str(), bob.member_id, ItemId::from(7u64), "right")?;
//! assert!(swipe.matched);
//! # Ok(())
//! # }
//! ```

mod broadcast;
mod error;
mod service;
pub mod telemetry;

pub use broadcast::{ChannelBroadcaster, EventBroadcaster, NoopBroadcaster, Outbound};
pub use error::StreammateError;
pub use service::{Streammate, StreammateBuilder};

/// Convenient imports for embedding Streammate.
pub mod prelude {
    pub use crate::{
        ChannelBroadcaster, EventBroadcaster, Outbound, Streammate,
        StreammateError,
    };
    pub use streammate_protocol::{
        ConnectionHandle, ContentCategory, Direction, ItemId, MemberId,
        ProtocolError, Recipient, RoomCode, RoomEvent,
    };
    pub use streammate_room::{
        ContentError, ContentProvider, RoomConfig, RoomError,
        StaticContentProvider,
    };
}
