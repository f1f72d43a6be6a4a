//! Outbound event fan-out.
//!
//! The core decides *what* happened and *who* should hear about it. An
//! [`EventBroadcaster`] decides how it gets there. Framing and sockets are
//! the transport's business.

use serde::Serialize;
use streammate_protocol::{Recipient, RoomEvent};
use tokio::sync::broadcast;

/// Receives every event the facade produces, after the room lock that
/// produced it has been released.
///
/// Implementations must not call back into [`Streammate`](crate::Streammate)
/// synchronously from `broadcast`.
pub trait EventBroadcaster: Send + Sync + 'static {
    fn broadcast(&self, recipient: Recipient, event: RoomEvent);
}

/// Drops every event. The default when no broadcaster is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBroadcaster;

impl EventBroadcaster for NoopBroadcaster {
    fn broadcast(&self, _recipient: Recipient, _event: RoomEvent) {}
}

/// One addressed event, as delivered to [`ChannelBroadcaster`] subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub recipient: Recipient,
    pub event: RoomEvent,
}

/// Publishes events on a tokio broadcast channel.
///
/// Each transport task subscribes and filters by room code and
/// [`Recipient::includes`]. With no subscribers events are dropped; a
/// subscriber that falls more than `capacity` events behind sees
/// `RecvError::Lagged` and should resync with `get_room_state`.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<Outbound>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBroadcaster for ChannelBroadcaster {
    fn broadcast(&self, recipient: Recipient, event: RoomEvent) {
        if self.tx.send(Outbound { recipient, event }).is_err() {
            tracing::trace!("event dropped: no subscribers");
        }
    }
}
