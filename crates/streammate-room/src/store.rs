//! The narrow storage seam behind the registry.
//!
//! Rooms live in memory and die with the process. Keeping the map behind
//! a get/put/delete/list trait means a different backing store can be
//! swapped in without touching membership or consensus logic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use streammate_protocol::RoomCode;

use crate::Room;

/// A room behind its own lock. Cloning the `Arc` is how callers get at a
/// room without holding the registry lock.
pub type SharedRoom = Arc<Mutex<Room>>;

/// Storage for the code → room map.
///
/// Implementations don't need internal locking: the registry serializes
/// every call behind a single mutex.
pub trait RoomStore: Send + 'static {
    fn get(&self, code: &RoomCode) -> Option<SharedRoom>;

    fn put(&mut self, code: RoomCode, room: SharedRoom);

    /// Removes and returns the room, if present.
    fn delete(&mut self, code: &RoomCode) -> Option<SharedRoom>;

    fn list(&self) -> Vec<RoomCode>;

    fn contains(&self, code: &RoomCode) -> bool {
        self.get(code).is_some()
    }

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `HashMap`-backed store. The default.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: HashMap<RoomCode, SharedRoom>,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn get(&self, code: &RoomCode) -> Option<SharedRoom> {
        self.rooms.get(code).cloned()
    }

    fn put(&mut self, code: RoomCode, room: SharedRoom) {
        self.rooms.insert(code, room);
    }

    fn delete(&mut self, code: &RoomCode) -> Option<SharedRoom> {
        self.rooms.remove(code)
    }

    fn list(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    fn contains(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    fn len(&self) -> usize {
        self.rooms.len()
    }
}
