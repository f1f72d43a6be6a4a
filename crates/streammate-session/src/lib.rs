//! Membership lifecycle for Streammate rooms.
//!
//! This crate decides who is in a room:
//!
//! 1. **Creation**: the creator becomes the first member
//! 2. **Joining**: unique display names per room
//! 3. **Reconnection**: a disconnected member reclaims their identity by
//!    presenting the rejoin token issued when they joined (only when a
//!    grace period is configured)
//! 4. **Departure**: leave, disconnect, or grace expiry; the last one out
//!    destroys the room
//!
//! # How it fits in the stack
//!
//! ```text
//! Service facade (above)   ← turns raw requests into calls, fans out events
//!     ↕
//! Membership (this crate)  ← admission rules, reconnection, departure
//!     ↕
//! Room layer (below)       ← Room aggregate, registry, per-room lock
//! ```
//!
//! Every operation returns the events it produced, paired with a
//! [`Recipient`](streammate_protocol::Recipient). Nothing here talks to a
//! transport.

mod membership;

pub use membership::{Admission, Departure, MembershipService};
