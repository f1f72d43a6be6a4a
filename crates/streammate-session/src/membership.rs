//! The membership service: who is in which room, and how they got there.
//!
//! Every method runs its whole decision inside
//! [`RoomRegistry::with_room`], so the checks ("is this name taken?",
//! "does this token belong to a disconnected member?") and the mutation
//! they guard happen atomically with respect to every other operation on
//! the same room.
//!
//! # Reconnection
//!
//! The only way to reuse an identity is to present the rejoin token that
//! was issued with it, while that member is marked disconnected. A
//! matching display name proves nothing: two different people can pick
//! "Sam". Joining under a name that is in use, without the right token,
//! is always [`RoomError::NameTaken`].
//!
//! ```text
//! create_room() / join() ──→ [Connected] ──disconnect()──→ [Disconnected]
//!                                 ↑                            │     │
//!                                 └──────join(token)───────────┘     │
//!                                                                    ▼
//!                          leave() / disconnect() with no grace / expire_disconnected()
//!                                                │
//!                                                ▼
//!                                           [removed]  (room destroyed if empty)
//! ```

use std::sync::Arc;
use std::time::Instant;

use streammate_protocol::{
    ConnectionHandle, ContentCategory, DeckRef, DisplayName, Dispatch,
    MemberId, MemberView, Recipient, RejoinToken, RoomCode, RoomEvent,
};
use streammate_room::{Member, Room, RoomError, RoomRegistry};

/// Result of creating or joining a room.
#[derive(Debug, Clone)]
pub struct Admission {
    pub room_code: RoomCode,
    /// The admitted (or reclaimed) member, including their rejoin token.
    pub member: Member,
    /// Full roster after admission.
    pub members: Vec<MemberView>,
    pub deck_ref: DeckRef,
    /// `true` if an existing identity was reclaimed with a rejoin token.
    pub reconnected: bool,
    pub events: Dispatch,
}

/// Result of a leave, disconnect, or expiry.
#[derive(Debug, Clone, Default)]
pub struct Departure {
    /// Roster after the change. Empty if the room was destroyed.
    pub members: Vec<MemberView>,
    /// `true` if the last member left and the room no longer exists.
    pub room_closed: bool,
    pub events: Dispatch,
}

/// Create, join, reconnect, leave, and disconnect.
pub struct MembershipService {
    registry: Arc<RoomRegistry>,
}

impl MembershipService {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Creates a room whose first member is the caller.
    pub fn create_room(
        &self,
        display_name: DisplayName,
        content_category: ContentCategory,
        connection: ConnectionHandle,
    ) -> Result<Admission, RoomError> {
        let (snapshot, member) = self.registry.create_room(
            display_name,
            content_category,
            connection,
        )?;

        let events = vec![(
            Recipient::Member(member.id),
            RoomEvent::RoomStateChanged {
                room_code: snapshot.room_code.clone(),
                members: snapshot.members.clone(),
            },
        )];

        Ok(Admission {
            room_code: snapshot.room_code,
            deck_ref: snapshot.deck_ref,
            member,
            members: snapshot.members,
            reconnected: false,
            events,
        })
    }

    /// Joins an existing room, or reclaims a disconnected identity.
    ///
    /// 1. Unknown code → [`RoomError::NotFound`].
    /// 2. `connection` already bound to a connected member →
    ///    [`RoomError::ConnectionInUse`].
    /// 3. `rejoin_token` matches a member who is disconnected and still
    ///    within the reconnection grace → rebind that member to
    ///    `connection` and return them. `display_name` is ignored on this
    ///    path; the member keeps their name.
    /// 4. `display_name` held by a current member → [`RoomError::NameTaken`].
    /// 5. Otherwise admit a new member with a fresh id and token.
    ///
    /// A token that matches nobody (or a connected member, or a member
    /// whose grace has run out) is not an error; the request simply
    /// continues as an ordinary join. Seats whose grace has run out are
    /// removed once the join succeeds, so their names are free again;
    /// a failed join leaves the room untouched.
    pub fn join(
        &self,
        code: &RoomCode,
        display_name: DisplayName,
        connection: ConnectionHandle,
        rejoin_token: Option<&RejoinToken>,
    ) -> Result<Admission, RoomError> {
        let grace = self.registry.config().reconnect_grace;
        let now = Instant::now();

        self.registry.with_room(code, |room| {
            if let Some(bound) = room.member_by_connection(connection) {
                tracing::debug!(
                    %code,
                    %connection,
                    member_id = %bound.id,
                    "connection already bound"
                );
                return Err(RoomError::ConnectionInUse(connection, code.clone()));
            }

            let expired = room.expired_members(grace, now);
            let reclaim = rejoin_token
                .and_then(|t| room.disconnected_member_by_token(t, grace, now));

            if reclaim.is_none() {
                self.registry.config().check_display_name(&display_name)?;
                let taken = room.members().iter().any(|m| {
                    m.display_name == display_name && !expired.contains(&m.id)
                });
                if taken {
                    tracing::debug!(%code, name = %display_name, "display name taken");
                    return Err(RoomError::NameTaken(display_name, code.clone()));
                }
            }

            let mut events = Vec::new();
            for member_id in expired {
                events.extend(remove_member(room, member_id, "grace expired").events);
            }

            let mut admission = match reclaim {
                Some(id) => reconnect(room, id, connection)?,
                None => admit(room, display_name, connection),
            };
            if !events.is_empty() {
                events.append(&mut admission.events);
                admission.events = events;
            }
            Ok(admission)
        })
    }

    /// Removes a member. Destroys the room if they were the last one.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] or [`RoomError::NotMember`].
    pub fn leave(
        &self,
        code: &RoomCode,
        member_id: MemberId,
    ) -> Result<Departure, RoomError> {
        self.registry.with_room(code, |room| {
            if !room.contains(member_id) {
                return Err(RoomError::NotMember(member_id, code.clone()));
            }
            Ok(remove_member(room, member_id, "left"))
        })
    }

    /// Handles a dropped transport connection.
    ///
    /// With no reconnection grace (the default) this is an immediate
    /// leave of whichever member is bound to `connection`. With a grace
    /// period the member is only marked disconnected and keeps their seat
    /// until they rejoin or [`expire_disconnected`](Self::expire_disconnected)
    /// removes them.
    ///
    /// A connection bound to no member (never joined, or superseded by a
    /// reconnect) is a no-op.
    pub fn disconnect(
        &self,
        code: &RoomCode,
        connection: ConnectionHandle,
    ) -> Result<Departure, RoomError> {
        let grace = self.registry.config().has_reconnect_grace();
        self.registry.with_room(code, |room| {
            let Some(member) = room.member_by_connection(connection) else {
                tracing::debug!(%code, %connection, "disconnect from unbound connection");
                return Ok(Departure {
                    members: room.member_views(),
                    ..Departure::default()
                });
            };
            let member_id = member.id;
            let connected = member.is_connected();

            if !grace {
                return Ok(remove_member(room, member_id, "disconnected"));
            }
            if !connected {
                return Ok(Departure {
                    members: room.member_views(),
                    ..Departure::default()
                });
            }

            room.mark_disconnected(member_id, Instant::now());
            tracing::info!(%code, %member_id, "member disconnected, grace period started");

            let members = room.member_views();
            let events = vec![
                (
                    Recipient::AllExcept(member_id),
                    RoomEvent::MemberDisconnected {
                        room_code: code.clone(),
                        member_id,
                    },
                ),
                (
                    Recipient::All,
                    RoomEvent::RoomStateChanged {
                        room_code: code.clone(),
                        members: members.clone(),
                    },
                ),
            ];
            Ok(Departure {
                members,
                room_closed: false,
                events,
            })
        })
    }

    /// Removes every disconnected member whose grace period has elapsed
    /// as of `now`, destroying rooms that end up empty.
    ///
    /// The core runs no timers; the caller invokes this periodically.
    pub fn expire_disconnected(&self, now: Instant) -> Dispatch {
        let grace = self.registry.config().reconnect_grace;
        let mut events = Vec::new();

        for code in self.registry.room_codes() {
            let result = self.registry.with_room(&code, |room| {
                let mut dispatch = Vec::new();
                for member_id in room.expired_members(grace, now) {
                    let departure =
                        remove_member(room, member_id, "grace expired");
                    dispatch.extend(departure.events);
                }
                Ok(dispatch)
            });
            match result {
                Ok(dispatch) => events.extend(dispatch),
                // Destroyed between listing and locking: nothing to expire.
                Err(RoomError::NotFound(_)) => {}
                Err(e) => tracing::warn!(%code, error = %e, "expiry skipped room"),
            }
        }

        events
    }

    /// Current roster of a room.
    pub fn members(&self, code: &RoomCode) -> Result<Vec<MemberView>, RoomError> {
        self.registry.with_room(code, |room| Ok(room.member_views()))
    }
}

// ---------------------------------------------------------------------------
// Helpers (run under the room lock)
// ---------------------------------------------------------------------------

fn admit(
    room: &mut Room,
    display_name: DisplayName,
    connection: ConnectionHandle,
) -> Admission {
    let code = room.code().clone();
    let member = room.admit(display_name, connection).clone();
    tracing::info!(
        %code,
        member_id = %member.id,
        members = room.len(),
        "member joined"
    );

    let members = room.member_views();
    let events = vec![
        (
            Recipient::AllExcept(member.id),
            RoomEvent::MemberJoined {
                room_code: code.clone(),
                member: member.view(),
            },
        ),
        (
            Recipient::All,
            RoomEvent::RoomStateChanged {
                room_code: code.clone(),
                members: members.clone(),
            },
        ),
    ];
    Admission {
        room_code: code,
        deck_ref: room.deck_ref().clone(),
        member,
        members,
        reconnected: false,
        events,
    }
}

fn reconnect(
    room: &mut Room,
    member_id: MemberId,
    connection: ConnectionHandle,
) -> Result<Admission, RoomError> {
    let code = room.code().clone();
    let member = room
        .rebind(member_id, connection)
        .cloned()
        .ok_or_else(|| RoomError::NotMember(member_id, code.clone()))?;
    tracing::info!(%code, %member_id, "member reconnected");

    let members = room.member_views();
    let events = vec![
        (
            Recipient::AllExcept(member_id),
            RoomEvent::MemberReconnected {
                room_code: code.clone(),
                member: member.view(),
            },
        ),
        (
            Recipient::All,
            RoomEvent::RoomStateChanged {
                room_code: code.clone(),
                members: members.clone(),
            },
        ),
    ];
    Ok(Admission {
        room_code: code,
        deck_ref: room.deck_ref().clone(),
        member,
        members,
        reconnected: true,
        events,
    })
}

fn remove_member(room: &mut Room, member_id: MemberId, reason: &str) -> Departure {
    let code = room.code().clone();
    room.remove_member(member_id);
    tracing::info!(%code, %member_id, members = room.len(), reason, "member removed");

    if room.is_empty() {
        return Departure {
            members: Vec::new(),
            room_closed: true,
            events: Vec::new(),
        };
    }

    let members = room.member_views();
    let events = vec![
        (
            Recipient::All,
            RoomEvent::MemberLeft {
                room_code: code.clone(),
                member_id,
            },
        ),
        (
            Recipient::All,
            RoomEvent::RoomStateChanged {
                room_code: code,
                members: members.clone(),
            },
        ),
    ];
    Departure {
        members,
        room_closed: false,
        events,
    }
}

// =========================================================================
// Tests
// =========================================================================
