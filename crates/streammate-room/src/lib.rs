//! Room data model and registry for Streammate.
//!
//! A room is a short-lived group of members swiping through one shared
//! deck. This crate owns:
//!
//! - [`Room`]: the aggregate of members, swipe log, match log, deck
//! - [`RoomRegistry`]: allocates codes, looks rooms up, destroys empty ones
//! - [`RoomStore`]: the narrow get/put/delete/list seam behind the registry
//! - [`ContentProvider`]: the external collaborator that hands out decks
//! - [`RoomConfig`]: code shape, retry budget, grace period, limits
//!
//! # Locking
//!
//! Two kinds of lock exist and they never nest the "wrong" way:
//!
//! ```text
//! registry lock : guards code → room map only (insert, lookup, remove)
//! room lock     : one per room, guards everything inside the room
//! ```
//!
//! The registry lock is released before a room lock is taken. The only
//! nesting is room → registry, when the last member leaves and the room
//! removes itself.

mod config;
mod content;
mod error;
mod registry;
mod room;
mod store;
mod token;

pub use config::RoomConfig;
pub use content::{ContentError, ContentProvider, StaticContentProvider};
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Match, Member, Presence, Room, Swipe, now_millis};
pub use store::{InMemoryRoomStore, RoomStore, SharedRoom};
