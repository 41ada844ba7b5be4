//! Read-side helper for the bounded world-event ring (spec §4.7, `GET
//! /world/events?limit=N`, WS `get_world_events`).
//!
//! The ring itself is owned by `npc-core`'s `SimulationState` (a
//! `VecDeque<WorldEvent>` capped at 1000 entries); this module only
//! defines the read contract the Boundary layer uses against it, so the
//! "latest N" semantics live in one place.

use std::collections::VecDeque;

use npc_types::WorldEvent;

/// Return up to `limit` most-recent events from `ring`, oldest first.
///
/// A `limit` of 0 or greater than the ring's length returns the whole
/// ring. This matches the teacher's event-log truncation style in
/// `EventStore::get_events_by_tick` (most-recent-first selection,
/// chronological output).
#[must_use]
pub fn ring_read(ring: &VecDeque<WorldEvent>, limit: usize) -> Vec<WorldEvent> {
    let take = if limit == 0 { ring.len() } else { limit.min(ring.len()) };
    let skip = ring.len().saturating_sub(take);
    ring.iter().skip(skip).cloned().collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use npc_types::{EventId, WorldTime};

    use super::*;

    fn event(kind: &str) -> WorldEvent {
        WorldEvent {
            id: EventId::new(),
            world_time: WorldTime::epoch(),
            kind: kind.to_owned(),
            summary: String::new(),
            details: serde_json::json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn limit_zero_returns_everything() {
        let mut ring = VecDeque::new();
        ring.push_back(event("a"));
        ring.push_back(event("b"));
        assert_eq!(ring_read(&ring, 0).len(), 2);
    }

    #[test]
    fn limit_caps_to_most_recent() {
        let mut ring = VecDeque::new();
        ring.push_back(event("a"));
        ring.push_back(event("b"));
        ring.push_back(event("c"));
        let read = ring_read(&ring, 2);
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].kind, "b");
        assert_eq!(read[1].kind, "c");
    }

    #[test]
    fn limit_larger_than_ring_returns_whole_ring() {
        let mut ring = VecDeque::new();
        ring.push_back(event("a"));
        assert_eq!(ring_read(&ring, 50).len(), 1);
    }
}
