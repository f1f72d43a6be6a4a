//! Swipe consensus for Streammate rooms.
//!
//! Members swipe accept or reject on items from the room's deck. A match
//! fires for an item when every *current* member's most recent swipe on
//! it is an accept, and the room has at least two members. See
//! [`SwipeConsensusEngine::record_swipe`] for the exact rule.

mod engine;

pub use engine::{MatchOutcome, SwipeConsensusEngine, SwipeOutcome};
