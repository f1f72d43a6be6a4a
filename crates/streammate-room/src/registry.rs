//! Room registry: allocates codes, tracks live rooms, removes empty ones.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::Rng;
use streammate_protocol::{
    ConnectionHandle, ContentCategory, DisplayName, RoomCode, RoomStateView,
};

use crate::{
    ContentProvider, InMemoryRoomStore, Member, Room, RoomConfig, RoomError,
    RoomStore, SharedRoom,
};

/// Owns the code → room map.
///
/// The registry lock covers only insert, lookup, and remove on that map.
/// Everything that happens inside a room runs under the room's own lock
/// (see [`with_room`](Self::with_room)), so operations on different rooms
/// never contend beyond the brief map lookup.
pub struct RoomRegistry {
    rooms: Mutex<Box<dyn RoomStore>>,
    config: RoomConfig,
    content: Arc<dyn ContentProvider>,
}

impl RoomRegistry {
    /// Creates a registry backed by an [`InMemoryRoomStore`].
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if `config` fails
    /// [`RoomConfig::validate`].
    pub fn new(
        config: RoomConfig,
        content: Arc<dyn ContentProvider>,
    ) -> Result<Self, RoomError> {
        Self::with_store(config, content, Box::new(InMemoryRoomStore::new()))
    }

    /// Creates a registry over a caller-supplied store.
    ///
    /// # Errors
    /// [`RoomError::InvalidConfig`] if `config` fails
    /// [`RoomConfig::validate`].
    pub fn with_store(
        config: RoomConfig,
        content: Arc<dyn ContentProvider>,
        store: Box<dyn RoomStore>,
    ) -> Result<Self, RoomError> {
        config.validate()?;
        Ok(Self {
            rooms: Mutex::new(store),
            config,
            content,
        })
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room with its first member.
    ///
    /// Returns a snapshot of the new room (taken before any other caller
    /// can see it) and the member, rejoin token included.
    ///
    /// The deck is requested before a code is drawn, so a failing content
    /// provider leaves no trace in the registry. Code collisions are
    /// retried up to `max_code_attempts` times; only when every draw
    /// collides does the caller see [`RoomError::CapacityExceeded`], and
    /// the deck is handed back to the provider.
    pub fn create_room(
        &self,
        display_name: DisplayName,
        content_category: ContentCategory,
        connection: ConnectionHandle,
    ) -> Result<(RoomStateView, Member), RoomError> {
        self.config.check_display_name(&display_name)?;
        let deck_ref = self.content.assign_deck(&content_category)?;

        let mut rooms = self.lock_rooms();
        for attempt in 1..=self.config.max_code_attempts {
            let code = self.generate_code();
            if rooms.contains(&code) {
                tracing::debug!(%code, attempt, "room code collision, retrying");
                continue;
            }

            let mut room = Room::new(code.clone(), content_category, deck_ref);
            let member = room.admit(display_name, connection).clone();
            let snapshot = room.state_view();
            rooms.put(code.clone(), Arc::new(Mutex::new(room)));

            tracing::info!(
                %code,
                member_id = %member.id,
                rooms = rooms.len(),
                "room created"
            );
            return Ok((snapshot, member));
        }

        drop(rooms);

        tracing::warn!(
            attempts = self.config.max_code_attempts,
            "room code space exhausted"
        );
        self.content.release_deck(&deck_ref);
        Err(RoomError::CapacityExceeded(self.config.max_code_attempts))
    }

    /// Looks up a live room.
    pub fn get_room(&self, code: &RoomCode) -> Result<SharedRoom, RoomError> {
        self.lock_rooms()
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Removes a room from the registry and closes it. Idempotent.
    ///
    /// Normally the registry does this itself when a room's last member
    /// leaves; calling it on a populated room evicts everyone at once.
    pub fn remove_room(&self, code: &RoomCode) {
        // Take the room out under the registry lock, then close it after
        // that lock is released: room locks are never awaited while the
        // registry lock is held.
        let Some(shared) = self.lock_rooms().delete(code) else {
            return;
        };
        let mut room = shared.lock().unwrap_or_else(PoisonError::into_inner);
        // Already reaped by `with_room`, which released the deck.
        if room.is_closed() {
            return;
        }
        room.close();
        let deck_ref = room.deck_ref().clone();
        drop(room);

        self.content.release_deck(&deck_ref);
        tracing::info!(%code, "room destroyed");
    }

    /// Runs `f` against a room while holding that room's lock.
    ///
    /// This is the single serialization point for everything that reads
    /// or mutates a room. After `f` returns, a room left with no members is
    /// closed and removed from the registry before the lock is released,
    /// so no other caller can ever observe an empty live room.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the code is unknown, or the room was
    ///   closed between lookup and locking.
    /// - [`RoomError::Unavailable`] if the room's lock is poisoned.
    /// - Whatever `f` returns.
    pub fn with_room<T>(
        &self,
        code: &RoomCode,
        f: impl FnOnce(&mut Room) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let shared = self.get_room(code)?;
        let mut room = shared.lock().map_err(|_| {
            tracing::warn!(%code, "room lock poisoned");
            RoomError::Unavailable(code.clone())
        })?;
        if room.is_closed() {
            return Err(RoomError::NotFound(code.clone()));
        }

        let result = f(&mut room);

        if !room.is_empty() {
            return result;
        }

        room.close();
        {
            let mut rooms = self.lock_rooms();
            if rooms.get(code).is_some_and(|live| Arc::ptr_eq(&live, &shared)) {
                rooms.delete(code);
            }
        }
        let deck_ref = room.deck_ref().clone();
        drop(room);

        self.content.release_deck(&deck_ref);
        tracing::info!(%code, "room destroyed");
        result
    }

    /// Codes of every live room.
    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.lock_rooms().list()
    }

    pub fn room_count(&self) -> usize {
        self.lock_rooms().len()
    }

    /// Draws one candidate code from the configured alphabet.
    fn generate_code(&self) -> RoomCode {
        let alphabet: Vec<char> = self.config.code_alphabet.chars().collect();
        let mut rng = rand::rng();
        let code: String = (0..self.config.code_length)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();
        RoomCode::new(code)
    }

    /// The map itself is only ever changed by single insert/delete calls,
    /// so a panic elsewhere can't leave it half-updated; recover from
    /// poisoning instead of propagating it.
    fn lock_rooms(&self) -> MutexGuard<'_, Box<dyn RoomStore>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
