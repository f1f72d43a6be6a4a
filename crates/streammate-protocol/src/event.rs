//! Domain events emitted by the core for the broadcaster to fan out.
//!
//! Every mutating operation returns a [`Dispatch`]. The core never talks
//! to sockets; whoever called it forwards these pairs to
//! an event broadcaster, which decides how to frame and deliver them.

use serde::{Deserialize, Serialize};

use crate::{Direction, ItemId, MemberId, MemberView, RoomCode};

/// Events paired with who should receive them, in emission order.
pub type Dispatch = Vec<(Recipient, RoomEvent)>;

/// Specifies which members of a room should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every member currently in the room.
    All,

    /// One specific member.
    Member(MemberId),

    /// Everyone except the given member. Used for "someone joined"
    /// notices, where the newcomer gets a full snapshot instead.
    AllExcept(MemberId),
}

impl Recipient {
    /// Returns `true` if `member` should receive an event addressed here.
    pub fn includes(&self, member: MemberId) -> bool {
        match self {
            Self::All => true,
            Self::Member(target) => *target == member,
            Self::AllExcept(excluded) => *excluded != member,
        }
    }
}

/// Something that happened in a room.
///
/// `#[serde(tag = "type")]` gives the JS-friendly shape
/// `{ "type": "MatchFound", "room_code": "...", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RoomEvent {
    /// A new member was admitted.
    MemberJoined {
        room_code: RoomCode,
        member: MemberView,
    },

    /// A member is gone for good (left, or disconnected without a grace
    /// period, or their grace period elapsed).
    MemberLeft {
        room_code: RoomCode,
        member_id: MemberId,
    },

    /// A member's connection dropped; they may still reclaim their seat
    /// with their rejoin token.
    MemberDisconnected {
        room_code: RoomCode,
        member_id: MemberId,
    },

    /// A disconnected member came back with a valid rejoin token.
    MemberReconnected {
        room_code: RoomCode,
        member: MemberView,
    },

    /// A swipe was appended to the room's log.
    SwipeRecorded {
        room_code: RoomCode,
        member_id: MemberId,
        item_id: ItemId,
        direction: Direction,
    },

    /// Every current member holds an accept on `item_id`.
    MatchFound {
        room_code: RoomCode,
        item_id: ItemId,
        member_ids: Vec<MemberId>,
    },

    /// The membership list changed; carries the full post-change roster.
    RoomStateChanged {
        room_code: RoomCode,
        members: Vec<MemberView>,
    },
}

impl RoomEvent {
    /// The room this event belongs to.
    pub fn room_code(&self) -> &RoomCode {
        match self {
            Self::MemberJoined { room_code, .. }
            | Self::MemberLeft { room_code, .. }
            | Self::MemberDisconnected { room_code, .. }
            | Self::MemberReconnected { room_code, .. }
            | Self::SwipeRecorded { room_code, .. }
            | Self::MatchFound { room_code, .. }
            | Self::RoomStateChanged { room_code, .. } => room_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_includes() {
        let a = MemberId(1);
        let b = MemberId(2);
        assert!(Recipient::All.includes(a));
        assert!(Recipient::Member(a).includes(a));
        assert!(!Recipient::Member(a).includes(b));
        assert!(!Recipient::AllExcept(a).includes(a));
        assert!(Recipient::AllExcept(a).includes(b));
    }

    #[test]
    fn test_match_found_serializes_internally_tagged() {
        let event = RoomEvent::MatchFound {
            room_code: RoomCode::new("ABC123"),
            item_id: ItemId::from(42u64),
            member_ids: vec![MemberId(1), MemberId(2)],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MatchFound");
        assert_eq!(json["room_code"], "ABC123");
        assert_eq!(json["item_id"], "42");
        assert_eq!(json["member_ids"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_room_code_accessor_covers_every_variant() {
        let code = RoomCode::new("XYZ789");
        let event = RoomEvent::MemberLeft {
            room_code: code.clone(),
            member_id: MemberId(3),
        };
        assert_eq!(event.room_code(), &code);
    }
}
