//! The `Streammate` facade and its builder.
//!
//! This is the surface the transport layer calls. It ties the layers
//! together: raw input → protocol types → membership / swipe engine →
//! events out through the broadcaster.

use std::sync::Arc;
use std::time::Instant;

use streammate_protocol::{
    ConnectionHandle, ContentCategory, CreateRoomResponse, Direction,
    Dispatch, DisplayName, ItemId, JoinRoomResponse, LeaveRoomResponse,
    MatchView, MemberId, RejoinToken, RoomCode, RoomStateView, SwipeResponse,
};
use streammate_room::{
    ContentProvider, InMemoryRoomStore, RoomConfig, RoomError, RoomRegistry,
    RoomStore,
};
use streammate_session::MembershipService;
use streammate_swipe::{MatchOutcome, SwipeConsensusEngine};

use crate::{EventBroadcaster, NoopBroadcaster, StreammateError};

/// Builder for configuring a [`Streammate`] instance.
///
/// # Example
///
/// ```rust,ignore
/// use streammate::prelude::*;
///
/// let app = Streammate::builder()
///     .room_config(RoomConfig::default())
///     .content(Arc::new(my_provider))
///     .broadcaster(Arc::new(ChannelBroadcaster::default()))
///     .build()?;
/// ```
pub struct StreammateBuilder {
    room_config: RoomConfig,
    content: Option<Arc<dyn ContentProvider>>,
    store: Option<Box<dyn RoomStore>>,
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl StreammateBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            room_config: RoomConfig::default(),
            content: None,
            store: None,
            broadcaster: Arc::new(NoopBroadcaster),
        }
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the content provider that assigns decks. Required.
    pub fn content(mut self, content: Arc<dyn ContentProvider>) -> Self {
        self.content = Some(content);
        self
    }

    /// Replaces the default in-memory room store.
    pub fn store(mut self, store: Box<dyn RoomStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets where events go. Defaults to dropping them.
    pub fn broadcaster(mut self, broadcaster: Arc<dyn EventBroadcaster>) -> Self {
        self.broadcaster = broadcaster;
        self
    }

    /// Validates the configuration and assembles the layers.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if the room configuration is unusable
    /// or no content provider was given.
    pub fn build(self) -> Result<Streammate, StreammateError> {
        let content = self.content.ok_or_else(|| {
            RoomError::InvalidConfig("a content provider is required".into())
        })?;
        let store = self
            .store
            .unwrap_or_else(|| Box::new(InMemoryRoomStore::new()));

        let registry = Arc::new(RoomRegistry::with_store(
            self.room_config,
            content,
            store,
        )?);

        tracing::debug!(
            code_length = registry.config().code_length,
            grace_ms = registry.config().reconnect_grace.as_millis() as u64,
            "streammate built"
        );

        Ok(Streammate {
            membership: MembershipService::new(Arc::clone(&registry)),
            swipes: SwipeConsensusEngine::new(Arc::clone(&registry)),
            registry,
            broadcaster: self.broadcaster,
        })
    }
}

impl Default for StreammateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Room membership and swipe consensus behind one handle.
///
/// Every method is synchronous and safe to call from many threads (or
/// tokio tasks) at once: operations on one room are serialized by that
/// room's lock, operations on different rooms run independently. Events
/// are handed to the broadcaster after the room lock is released.
pub struct Streammate {
    registry: Arc<RoomRegistry>,
    membership: MembershipService,
    swipes: SwipeConsensusEngine,
    broadcaster: Arc<dyn EventBroadcaster>,
}

impl Streammate {
    /// Creates a new builder.
    pub fn builder() -> StreammateBuilder {
        StreammateBuilder::new()
    }

    /// Creates a room whose first member is the caller.
    pub fn create_room(
        &self,
        display_name: &str,
        content_category: &str,
        connection: ConnectionHandle,
    ) -> Result<CreateRoomResponse, StreammateError> {
        let display_name = DisplayName::parse(display_name)?;
        let content_category = ContentCategory::parse(content_category)?;

        let admission = self.membership.create_room(
            display_name,
            content_category,
            connection,
        )?;
        self.publish(admission.events);

        Ok(CreateRoomResponse {
            room_code: admission.room_code,
            member_id: admission.member.id,
            rejoin_token: admission.member.rejoin_token,
            deck_ref: admission.deck_ref,
        })
    }

    /// Joins a room, or reclaims a disconnected identity when
    /// `rejoin_token` belongs to one. A blank token counts as none.
    pub fn join_room(
        &self,
        room_code: &str,
        display_name: &str,
        connection: ConnectionHandle,
        rejoin_token: Option<&str>,
    ) -> Result<JoinRoomResponse, StreammateError> {
        let code = RoomCode::parse(room_code)?;
        let display_name = DisplayName::parse(display_name)?;
        let token = rejoin_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(RejoinToken::new);

        let admission = self.membership.join(
            &code,
            display_name,
            connection,
            token.as_ref(),
        )?;
        self.publish(admission.events);

        Ok(JoinRoomResponse {
            member_id: admission.member.id,
            rejoin_token: admission.member.rejoin_token,
            members: admission.members,
            reconnected: admission.reconnected,
        })
    }

    /// Removes a member. The last one out destroys the room.
    pub fn leave_room(
        &self,
        room_code: &str,
        member_id: MemberId,
    ) -> Result<LeaveRoomResponse, StreammateError> {
        let code = RoomCode::parse(room_code)?;
        let departure = self.membership.leave(&code, member_id)?;
        self.publish(departure.events);
        Ok(LeaveRoomResponse {
            members: departure.members,
        })
    }

    /// Reports a dropped connection. See
    /// [`MembershipService::disconnect`] for grace-period behavior.
    pub fn disconnect(
        &self,
        room_code: &str,
        connection: ConnectionHandle,
    ) -> Result<(), StreammateError> {
        let code = RoomCode::parse(room_code)?;
        let departure = self.membership.disconnect(&code, connection)?;
        self.publish(departure.events);
        Ok(())
    }

    /// Records a swipe and reports whether it completed a match.
    ///
    /// `direction` accepts `accept`/`reject` and the legacy aliases
    /// `right`/`left` and `like`/`dislike`.
    pub fn record_swipe(
        &self,
        room_code: &str,
        member_id: MemberId,
        item_id: ItemId,
        direction: &str,
    ) -> Result<SwipeResponse, StreammateError> {
        let code = RoomCode::parse(room_code)?;
        let direction: Direction = direction.parse()?;

        let swipe = self.swipes.record_swipe(&code, member_id, item_id, direction)?;
        self.publish(swipe.events);

        Ok(match swipe.outcome {
            MatchOutcome::MatchFound { member_ids, .. } => SwipeResponse {
                matched: true,
                matched_members: Some(member_ids.into_iter().collect()),
            },
            MatchOutcome::NoMatch => SwipeResponse {
                matched: false,
                matched_members: None,
            },
        })
    }

    /// Snapshot of a room: members, category, deck, recorded matches.
    pub fn get_room_state(
        &self,
        room_code: &str,
    ) -> Result<RoomStateView, StreammateError> {
        let code = RoomCode::parse(room_code)?;
        Ok(self.registry.with_room(&code, |room| Ok(room.state_view()))?)
    }

    /// Matches recorded in a room, oldest first.
    pub fn matches(&self, room_code: &str) -> Result<Vec<MatchView>, StreammateError> {
        let code = RoomCode::parse(room_code)?;
        Ok(self.swipes.matches(&code)?)
    }

    /// Removes disconnected members whose grace period has elapsed.
    /// Returns how many events were published.
    ///
    /// Call periodically when a reconnection grace is configured; with
    /// the default configuration there is never anything to expire.
    pub fn expire_disconnected(&self, now: Instant) -> usize {
        let events = self.membership.expire_disconnected(now);
        let count = events.len();
        self.publish(events);
        count
    }

    /// Codes of every live room.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.registry.room_codes()
    }

    pub fn room_count(&self) -> usize {
        self.registry.room_count()
    }

    pub fn config(&self) -> &RoomConfig {
        self.registry.config()
    }

    fn publish(&self, events: Dispatch) {
        for (recipient, event) in events {
            self.broadcaster.broadcast(recipient, event);
        }
    }
}
