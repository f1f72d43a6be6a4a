//! Values returned to the transport layer by the core's operations.

use serde::{Deserialize, Serialize};

use crate::{
    ContentCategory, DeckRef, DisplayName, ItemId, MemberId, RejoinToken,
    RoomCode,
};

/// Public view of one member. Never carries the rejoin token or the
/// connection handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub id: MemberId,
    pub display_name: DisplayName,
    /// `false` while the member is inside a reconnection grace period.
    pub connected: bool,
}

/// A recorded match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub item_id: ItemId,
    pub member_ids: Vec<MemberId>,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Result of `createRoom`. The token goes only to the creating client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_code: RoomCode,
    pub member_id: MemberId,
    pub rejoin_token: RejoinToken,
    pub deck_ref: DeckRef,
}

/// Result of `joinRoom`, for both fresh joins and reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub member_id: MemberId,
    pub rejoin_token: RejoinToken,
    pub members: Vec<MemberView>,
    /// `true` when an existing identity was reclaimed with a rejoin token.
    pub reconnected: bool,
}

/// Result of `leaveRoom`: the roster after removal. Empty when the leaver
/// was the last member and the room has been destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRoomResponse {
    pub members: Vec<MemberView>,
}

/// Result of `recordSwipe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_members: Option<Vec<MemberId>>,
}

/// Result of `getRoomState`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomStateView {
    pub room_code: RoomCode,
    pub members: Vec<MemberView>,
    pub content_category: ContentCategory,
    pub deck_ref: DeckRef,
    pub matches: Vec<MatchView>,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: u64,
}
