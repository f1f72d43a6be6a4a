use std::collections::BTreeSet;
use std::sync::Arc;

use streammate_protocol::{
    Direction, Dispatch, ItemId, MatchView, MemberId, Recipient, RoomCode,
    RoomEvent,
};
use streammate_room::{Room, RoomError, RoomRegistry, Swipe, now_millis};

/// What a single swipe decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Every current member accepts the item; a new match was recorded.
    MatchFound {
        item_id: ItemId,
        member_ids: BTreeSet<MemberId>,
    },
    NoMatch,
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, Self::MatchFound { .. })
    }
}

/// A recorded swipe: the decision plus the events to fan out.
#[derive(Debug, Clone)]
pub struct SwipeOutcome {
    pub outcome: MatchOutcome,
    pub events: Dispatch,
}

/// Records swipes and detects matches.
///
/// Holds no state of its own. Everything lives in the [`Room`], and every
/// swipe is applied under that room's lock, so the member set and the
/// accept set are read together.
pub struct SwipeConsensusEngine {
    registry: Arc<RoomRegistry>,
}

impl SwipeConsensusEngine {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Records a swipe and evaluates consensus on the item.
    ///
    /// 1. Unknown room → [`RoomError::NotFound`]; unknown member →
    ///    [`RoomError::NotMember`]. Nothing is recorded.
    /// 2. The swipe is appended and becomes the member's effective
    ///    decision on `item_id`.
    /// 3. On accept, let `S` be the current members whose latest swipe on
    ///    the item is accept. A match is recorded iff `S` is the whole
    ///    member set, `|S|` meets the configured minimum, and no match for
    ///    exactly `(item_id, S)` exists yet.
    ///
    /// Rejects never evaluate. Neither do leaves: a match only fires on
    /// the accept that completes it.
    pub fn record_swipe(
        &self,
        code: &RoomCode,
        member_id: MemberId,
        item_id: ItemId,
        direction: Direction,
    ) -> Result<SwipeOutcome, RoomError> {
        let min_size = self.registry.config().effective_min_match_size();

        self.registry.with_room(code, |room| {
            if !room.contains(member_id) {
                tracing::debug!(%code, %member_id, "swipe from non-member rejected");
                return Err(RoomError::NotMember(member_id, code.clone()));
            }

            room.append_swipe(Swipe {
                member_id,
                item_id: item_id.clone(),
                direction,
                timestamp_ms: now_millis(),
            });
            tracing::debug!(%code, %member_id, %item_id, %direction, "swipe recorded");

            let mut events = vec![(
                Recipient::AllExcept(member_id),
                RoomEvent::SwipeRecorded {
                    room_code: code.clone(),
                    member_id,
                    item_id: item_id.clone(),
                    direction,
                },
            )];

            let outcome = if direction.is_accept() {
                evaluate(room, &item_id, min_size)
            } else {
                MatchOutcome::NoMatch
            };

            if let MatchOutcome::MatchFound { item_id, member_ids } = &outcome {
                tracing::info!(
                    %code,
                    %item_id,
                    members = member_ids.len(),
                    "match found"
                );
                events.push((
                    Recipient::All,
                    RoomEvent::MatchFound {
                        room_code: code.clone(),
                        item_id: item_id.clone(),
                        member_ids: member_ids.iter().copied().collect(),
                    },
                ));
            }

            Ok(SwipeOutcome { outcome, events })
        })
    }

    /// Matches recorded in a room, oldest first.
    pub fn matches(&self, code: &RoomCode) -> Result<Vec<MatchView>, RoomError> {
        self.registry.with_room(code, |room| {
            Ok(room.matches().iter().map(|m| m.view()).collect())
        })
    }
}

fn evaluate(room: &mut Room, item_id: &ItemId, min_size: usize) -> MatchOutcome {
    let accepters = room.current_accepters(item_id);
    if accepters.len() < min_size
        || accepters != room.member_ids()
        || room.has_match(item_id, &accepters)
    {
        return MatchOutcome::NoMatch;
    }

    room.record_match(item_id.clone(), accepters.clone());
    MatchOutcome::MatchFound {
        item_id: item_id.clone(),
        member_ids: accepters,
    }
}
