//! Server-to-client push payloads fanned out by [`crate::bus::EventBus`].
//!
//! These correspond to the `world_event`, `faction_update`, and
//! `quest_update` frame types the Boundary layer's WebSocket sends
//! unsolicited (spec §6): background simulation activity a subscribed
//! client should see without polling.

use npc_types::{Faction, Quest, WorldEvent};
use serde::{Deserialize, Serialize};

/// A fan-out message tagged by `type`, matching the WebSocket frame shape
/// every other Boundary message uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A single world-event-log entry, pushed as soon as a tick appends it.
    WorldEvent(WorldEvent),
    /// A faction's relation/territory/resource state changed.
    FactionUpdate(Faction),
    /// A quest transitioned state (accepted, completed, expired).
    QuestUpdate(Quest),
}

impl OutboundMessage {
    /// The `type` discriminant this message serializes under, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WorldEvent(_) => "world_event",
            Self::FactionUpdate(_) => "faction_update",
            Self::QuestUpdate(_) => "quest_update",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use npc_types::{EventId, WorldTime};

    #[test]
    fn world_event_serializes_with_type_tag() {
        let msg = OutboundMessage::WorldEvent(WorldEvent {
            id: EventId::new(),
            world_time: WorldTime::epoch(),
            kind: "gossip".to_owned(),
            summary: "two agents traded rumors".to_owned(),
            details: serde_json::json!({}),
            created_at: Utc::now(),
        });
        let value = serde_json::to_value(&msg).unwrap_or_default();
        assert_eq!(value.get("type").and_then(|v| v.as_str()), Some("world_event"));
        assert_eq!(msg.kind(), "world_event");
    }
}
