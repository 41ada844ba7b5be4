//! In-process pub/sub fan-out for world events, faction updates, and quest
//! updates, consumed by the Boundary WebSocket handler's `subscribe_events`
//! support (spec §6).
//!
//! Mirrors the teacher's Observer API broadcast channel: every connected
//! client gets its own [`tokio::sync::broadcast::Receiver`], and a slow
//! client that falls behind is skipped forward rather than blocking
//! publishers.

use tokio::sync::broadcast;

use crate::message::OutboundMessage;

/// Capacity of the broadcast channel.
///
/// A subscriber more than this many messages behind receives
/// [`broadcast::error::RecvError::Lagged`] and jumps to the newest message
/// rather than blocking the publisher.
const BROADCAST_CAPACITY: usize = 256;

/// Shared fan-out point for Boundary-bound event messages.
///
/// Cheap to clone; the underlying [`broadcast::Sender`] is reference
/// counted.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OutboundMessage>,
}

impl EventBus {
    /// Create a new, empty event bus.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }

    /// Subscribe a new client. Only messages published after this call are
    /// delivered to the returned receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundMessage> {
        self.tx.subscribe()
    }

    /// Publish a message to every current subscriber.
    ///
    /// Returns the number of receivers the message was delivered to. Zero
    /// receivers (no connected clients) is not an error.
    pub fn publish(&self, message: OutboundMessage) -> usize {
        self.tx.send(message).unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use npc_types::{EventId, WorldEvent, WorldTime};

    use super::*;

    fn sample_event() -> OutboundMessage {
        OutboundMessage::WorldEvent(WorldEvent {
            id: EventId::new(),
            world_time: WorldTime::epoch(),
            kind: "quest_expired".to_owned(),
            summary: "a quest expired".to_owned(),
            details: serde_json::json!({}),
            created_at: Utc::now(),
        })
    }

    #[test]
    fn publish_with_no_subscribers_returns_zero() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(sample_event()), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_published_message() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(sample_event()), 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind(), "world_event");
    }

    #[tokio::test]
    async fn subscriber_does_not_see_messages_published_before_it_joined() {
        let bus = EventBus::new();
        bus.publish(sample_event());
        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(sample_event()), 1);
        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind(), "world_event");
        assert!(rx.try_recv().is_err());
    }
}
