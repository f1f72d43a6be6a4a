//! The room aggregate: members, swipe log, match log, and deck.
//!
//! `Room` only provides primitive, infallible mutations. The rules that
//! decide *whether* to call them (name uniqueness, reconnection, match
//! consensus) live in the membership and swipe services, which run them
//! while holding the room's lock.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use streammate_protocol::{
    ConnectionHandle, ContentCategory, DeckRef, Direction, DisplayName, ItemId,
    MatchView, MemberId, MemberView, RejoinToken, RoomCode, RoomStateView,
};

use crate::token::generate_rejoin_token;

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Presence
// ---------------------------------------------------------------------------

/// Whether a member's transport connection is currently live.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace elapsed)──→ removed
///       ↑                            │
///       └──────(rejoin token)────────┘
/// ```
///
/// With a zero grace period members never enter `Disconnected`; they are
/// removed on disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Connected,
    /// Dropped at `since`; reclaimable until `since + reconnect_grace`.
    Disconnected { since: Instant },
}

// ---------------------------------------------------------------------------
// Member / Swipe / Match
// ---------------------------------------------------------------------------

/// One participant in a room.
#[derive(Debug, Clone)]
pub struct Member {
    /// Stable for the member's lifetime in the room; never reused.
    pub id: MemberId,

    /// Unique among the room's current members.
    pub display_name: DisplayName,

    /// The transport connection this member is bound to right now.
    pub connection: ConnectionHandle,

    /// Secret required to reclaim this identity after a disconnect.
    pub rejoin_token: RejoinToken,

    pub presence: Presence,

    pub joined_at_ms: u64,
}

impl Member {
    pub fn is_connected(&self) -> bool {
        matches!(self.presence, Presence::Connected)
    }

    /// Public view with the secret parts stripped.
    pub fn view(&self) -> MemberView {
        MemberView {
            id: self.id,
            display_name: self.display_name.clone(),
            connected: self.is_connected(),
        }
    }
}

/// One accept/reject decision. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swipe {
    pub member_id: MemberId,
    pub item_id: ItemId,
    pub direction: Direction,
    pub timestamp_ms: u64,
}

/// The record that a set of members all accepted the same item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub item_id: ItemId,
    pub member_ids: BTreeSet<MemberId>,
    pub timestamp_ms: u64,
}

impl Match {
    pub fn view(&self) -> MatchView {
        MatchView {
            item_id: self.item_id.clone(),
            member_ids: self.member_ids.iter().copied().collect(),
            timestamp_ms: self.timestamp_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A live room.
///
/// Constructed only by the registry, which also guarantees the code is
/// unique. A room with zero members is closed and removed from the
/// registry in the same critical section that removed its last member.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    /// Insertion order is kept for display; matching ignores it.
    members: Vec<Member>,
    swipes: Vec<Swipe>,
    matches: Vec<Match>,
    /// Latest direction per (item, member). The swipe log keeps every
    /// swipe for audit; this index is what consensus reads.
    effective: HashMap<ItemId, HashMap<MemberId, Direction>>,
    content_category: ContentCategory,
    deck_ref: DeckRef,
    created_at_ms: u64,
    next_member_id: u64,
    closed: bool,
}

impl Room {
    pub(crate) fn new(
        code: RoomCode,
        content_category: ContentCategory,
        deck_ref: DeckRef,
    ) -> Self {
        Self {
            code,
            members: Vec::new(),
            swipes: Vec::new(),
            matches: Vec::new(),
            effective: HashMap::new(),
            content_category,
            deck_ref,
            created_at_ms: now_millis(),
            next_member_id: 1,
            closed: false,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn content_category(&self) -> &ContentCategory {
        &self.content_category
    }

    /// The deck assigned when the room was created. Never changes.
    pub fn deck_ref(&self) -> &DeckRef {
        &self.deck_ref
    }

    pub fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    // -- Membership -------------------------------------------------------

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: MemberId) -> bool {
        self.member(id).is_some()
    }

    /// The connected member bound to `connection`. At most one exists:
    /// the membership service refuses to bind a handle twice. A
    /// disconnected member's stale handle never matches.
    pub fn member_by_connection(
        &self,
        connection: ConnectionHandle,
    ) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.is_connected() && m.connection == connection)
    }

    /// The id set consensus is evaluated against.
    pub fn member_ids(&self) -> BTreeSet<MemberId> {
        self.members.iter().map(|m| m.id).collect()
    }

    pub fn member_views(&self) -> Vec<MemberView> {
        self.members.iter().map(Member::view).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if a current member already uses `name`.
    pub fn is_name_taken(&self, name: &DisplayName) -> bool {
        self.members.iter().any(|m| &m.display_name == name)
    }

    /// Finds the member a rejoin token belongs to, but only if that member
    /// is disconnected and still within `grace` as of `now`. Tokens of
    /// connected members, and of members whose grace has run out, reclaim
    /// nothing.
    pub fn disconnected_member_by_token(
        &self,
        token: &RejoinToken,
        grace: Duration,
        now: Instant,
    ) -> Option<MemberId> {
        self.members
            .iter()
            .find(|m| match m.presence {
                Presence::Disconnected { since } => {
                    &m.rejoin_token == token
                        && now.saturating_duration_since(since) <= grace
                }
                Presence::Connected => false,
            })
            .map(|m| m.id)
    }

    /// Appends a new member with a fresh id and rejoin token.
    ///
    /// Does not check name uniqueness; callers do that first.
    pub fn admit(
        &mut self,
        display_name: DisplayName,
        connection: ConnectionHandle,
    ) -> &Member {
        let id = MemberId(self.next_member_id);
        self.next_member_id += 1;
        self.members.push(Member {
            id,
            display_name,
            connection,
            rejoin_token: generate_rejoin_token(),
            presence: Presence::Connected,
            joined_at_ms: now_millis(),
        });
        &self.members[self.members.len() - 1]
    }

    /// Removes a member. Their swipes stay in the log.
    pub fn remove_member(&mut self, id: MemberId) -> Option<Member> {
        let index = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(index))
    }

    /// Binds a member to a new connection and marks them connected.
    pub fn rebind(
        &mut self,
        id: MemberId,
        connection: ConnectionHandle,
    ) -> Option<&Member> {
        let member = self.members.iter_mut().find(|m| m.id == id)?;
        member.connection = connection;
        member.presence = Presence::Connected;
        Some(&*member)
    }

    /// Marks a member disconnected as of `since`. Returns `false` if the
    /// member doesn't exist.
    pub fn mark_disconnected(&mut self, id: MemberId, since: Instant) -> bool {
        match self.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.presence = Presence::Disconnected { since };
                true
            }
            None => false,
        }
    }

    /// Members whose grace period has elapsed as of `now`.
    pub fn expired_members(
        &self,
        grace: Duration,
        now: Instant,
    ) -> Vec<MemberId> {
        self.members
            .iter()
            .filter(|m| match m.presence {
                Presence::Disconnected { since } => {
                    now.saturating_duration_since(since) > grace
                }
                Presence::Connected => false,
            })
            .map(|m| m.id)
            .collect()
    }

    // -- Swipes and matches ----------------------------------------------

    pub fn swipes(&self) -> &[Swipe] {
        &self.swipes
    }

    /// Appends a swipe and makes it the member's effective decision on
    /// that item.
    pub fn append_swipe(&mut self, swipe: Swipe) {
        self.effective
            .entry(swipe.item_id.clone())
            .or_default()
            .insert(swipe.member_id, swipe.direction);
        self.swipes.push(swipe);
    }

    /// The member's most recent decision on `item`, if any.
    pub fn effective_direction(
        &self,
        member: MemberId,
        item: &ItemId,
    ) -> Option<Direction> {
        self.effective.get(item)?.get(&member).copied()
    }

    /// Current members whose most recent swipe on `item` is an accept.
    ///
    /// Departed members are excluded even though their swipes remain in
    /// the log.
    pub fn current_accepters(&self, item: &ItemId) -> BTreeSet<MemberId> {
        let Some(decisions) = self.effective.get(item) else {
            return BTreeSet::new();
        };
        self.members
            .iter()
            .filter(|m| {
                decisions
                    .get(&m.id)
                    .is_some_and(|direction| direction.is_accept())
            })
            .map(|m| m.id)
            .collect()
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Returns `true` if a match for exactly this (item, member set) exists.
    pub fn has_match(&self, item: &ItemId, members: &BTreeSet<MemberId>) -> bool {
        self.matches
            .iter()
            .any(|m| &m.item_id == item && &m.member_ids == members)
    }

    /// Appends a match. Callers check [`has_match`](Self::has_match) first.
    pub fn record_match(
        &mut self,
        item_id: ItemId,
        member_ids: BTreeSet<MemberId>,
    ) -> &Match {
        self.matches.push(Match {
            item_id,
            member_ids,
            timestamp_ms: now_millis(),
        });
        &self.matches[self.matches.len() - 1]
    }

    // -- Lifecycle --------------------------------------------------------

    /// `true` once the room has been removed from the registry. A caller
    /// that grabbed the room just before removal sees this and reports
    /// the room as not found.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    /// Snapshot for `getRoomState`.
    pub fn state_view(&self) -> RoomStateView {
        RoomStateView {
            room_code: self.code.clone(),
            members: self.member_views(),
            content_category: self.content_category.clone(),
            deck_ref: self.deck_ref.clone(),
            matches: self.matches.iter().map(Match::view).collect(),
            created_at_ms: self.created_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new(
            RoomCode::new("TEST01"),
            ContentCategory::parse("movies").unwrap(),
            DeckRef::new("movies-1"),
        )
    }

    fn name(s: &str) -> DisplayName {
        DisplayName::parse(s).unwrap()
    }

    fn conn(id: u64) -> ConnectionHandle {
        ConnectionHandle::new(id)
    }

    fn swipe(member: MemberId, item: u64, direction: Direction) -> Swipe {
        Swipe {
            member_id: member,
            item_id: ItemId::from(item),
            direction,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_admit_assigns_increasing_ids() {
        let mut room = room();
        let a = room.admit(name("alice"), conn(1)).id;
        let b = room.admit(name("bob"), conn(2)).id;
        assert_eq!(a, MemberId(1));
        assert_eq!(b, MemberId(2));
        assert_eq!(room.len(), 2);
    }

    #[test]
    fn test_admit_never_reuses_ids_after_leave() {
        let mut room = room();
        let a = room.admit(name("alice"), conn(1)).id;
        room.remove_member(a).unwrap();
        let again = room.admit(name("alice"), conn(1)).id;
        assert_ne!(a, again);
    }

    #[test]
    fn test_is_name_taken_only_counts_current_members() {
        let mut room = room();
        let a = room.admit(name("alice"), conn(1)).id;
        assert!(room.is_name_taken(&name("alice")));
        room.remove_member(a);
        assert!(!room.is_name_taken(&name("alice")));
    }

    #[test]
    fn test_disconnected_member_by_token_ignores_connected_members() {
        let mut room = room();
        let member = room.admit(name("alice"), conn(1)).clone();
        let grace = Duration::from_secs(30);
        let now = Instant::now();

        assert_eq!(
            room.disconnected_member_by_token(&member.rejoin_token, grace, now),
            None
        );

        room.mark_disconnected(member.id, now);
        assert_eq!(
            room.disconnected_member_by_token(&member.rejoin_token, grace, now),
            Some(member.id)
        );
    }

    #[test]
    fn test_disconnected_member_by_token_past_grace_returns_none() {
        let mut room = room();
        let member = room.admit(name("alice"), conn(1)).clone();
        let since = Instant::now();
        room.mark_disconnected(member.id, since);
        let grace = Duration::from_secs(30);

        assert_eq!(
            room.disconnected_member_by_token(
                &member.rejoin_token,
                grace,
                since + Duration::from_secs(30)
            ),
            Some(member.id)
        );
        assert_eq!(
            room.disconnected_member_by_token(
                &member.rejoin_token,
                grace,
                since + Duration::from_secs(31)
            ),
            None
        );
    }

    #[test]
    fn test_member_by_connection_skips_disconnected_members() {
        let mut room = room();
        let id = room.admit(name("alice"), conn(1)).id;
        assert_eq!(room.member_by_connection(conn(1)).map(|m| m.id), Some(id));

        room.mark_disconnected(id, Instant::now());
        assert!(room.member_by_connection(conn(1)).is_none());
    }

    #[test]
    fn test_rebind_restores_connected_presence() {
        let mut room = room();
        let id = room.admit(name("alice"), conn(1)).id;
        room.mark_disconnected(id, Instant::now());

        let member = room.rebind(id, conn(9)).unwrap();
        assert!(member.is_connected());
        assert_eq!(member.connection, conn(9));
    }

    #[test]
    fn test_expired_members_respects_grace() {
        let mut room = room();
        let id = room.admit(name("alice"), conn(1)).id;
        let since = Instant::now();
        room.mark_disconnected(id, since);

        let grace = Duration::from_secs(30);
        assert!(room.expired_members(grace, since + Duration::from_secs(10)).is_empty());
        assert_eq!(
            room.expired_members(grace, since + Duration::from_secs(31)),
            vec![id]
        );
    }

    #[test]
    fn test_latest_swipe_supersedes_earlier_one() {
        let mut room = room();
        let a = room.admit(name("alice"), conn(1)).id;
        room.append_swipe(swipe(a, 7, Direction::Accept));
        room.append_swipe(swipe(a, 7, Direction::Reject));

        assert_eq!(
            room.effective_direction(a, &ItemId::from(7u64)),
            Some(Direction::Reject)
        );
        assert_eq!(room.swipes().len(), 2, "log keeps every swipe");
        assert!(room.current_accepters(&ItemId::from(7u64)).is_empty());
    }

    #[test]
    fn test_current_accepters_excludes_departed_members() {
        let mut room = room();
        let a = room.admit(name("alice"), conn(1)).id;
        let b = room.admit(name("bob"), conn(2)).id;
        room.append_swipe(swipe(a, 7, Direction::Accept));
        room.append_swipe(swipe(b, 7, Direction::Accept));
        room.remove_member(a);

        let accepters = room.current_accepters(&ItemId::from(7u64));
        assert_eq!(accepters, BTreeSet::from([b]));
    }

    #[test]
    fn test_has_match_compares_member_sets() {
        let mut room = room();
        let item = ItemId::from(7u64);
        let ab = BTreeSet::from([MemberId(1), MemberId(2)]);
        let abc = BTreeSet::from([MemberId(1), MemberId(2), MemberId(3)]);
        room.record_match(item.clone(), ab.clone());

        assert!(room.has_match(&item, &ab));
        assert!(!room.has_match(&item, &abc));
        assert!(!room.has_match(&ItemId::from(8u64), &ab));
    }

    #[test]
    fn test_state_view_hides_tokens() {
        let mut room = room();
        room.admit(name("alice"), conn(1));
        let view = room.state_view();
        assert_eq!(view.members.len(), 1);
        assert_eq!(view.deck_ref, DeckRef::new("movies-1"));
        assert!(view.members[0].connected);
    }
}
