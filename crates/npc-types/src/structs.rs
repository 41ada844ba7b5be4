//! Core entity structs for the NPC simulation engine.
//!
//! Covers every entity named in the data model: `Agent`, `Memory`, `Rumor`,
//! `Relation`, `Reputation`, `Faction`, `Territory`, `TradeRoute`, `Battle`,
//! `Quest`, `ConversationGroup`, `WorldTime`, and the `CognitiveFrame`
//! produced by one Brain call.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{
    BattleStatus, FactionRelationLabel, Intent, MemoryCategory, QuestStatus, ResponseType,
    TradeRouteStatus,
};
use crate::ids::{
    AgentId, BattleId, EventId, FactionId, GroupId, MemoryId, PlayerId, QuestId, RumorId,
    TerritoryId, TradeRouteId,
};

/// Lower bound every personality trait is soft-clamped to.
pub const TRAIT_FLOOR: f64 = 0.05;
/// Upper bound every personality trait is soft-clamped to.
pub const TRAIT_CEILING: f64 = 0.95;

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// The nine-trait personality vector assigned at agent creation.
///
/// Every trait lives in `[0.05, 0.95]`; mutation only ever happens through
/// [`crate::structs::DeltaLogEntry`]-producing soft-clamp updates, never by
/// direct assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Likelihood to explore, investigate, and learn from observation.
    pub curiosity: f64,
    /// Preference for collaboration versus solo action.
    pub cooperation: f64,
    /// Tendency toward conflict, competition, and dominance.
    pub aggression: f64,
    /// Willingness to take uncertain actions.
    pub risk_tolerance: f64,
    /// Preference for productive work versus rest or leisure.
    pub industriousness: f64,
    /// Desire for interaction versus solitude.
    pub sociability: f64,
    /// Tendency toward truthful communication.
    pub honesty: f64,
    /// Commitment to relationships and groups.
    pub loyalty: f64,
    /// Baseline suspicion of strangers and unfamiliar claims; feeds
    /// [`crate::structs::ConversationGroup`] tension via paranoia.
    pub paranoia: f64,
}

impl Personality {
    /// Iterate the nine named traits as `(name, value)` pairs, in a stable
    /// order used by the Delta-Log and by prompt assembly.
    #[must_use]
    pub fn traits(&self) -> [(&'static str, f64); 9] {
        [
            ("curiosity", self.curiosity),
            ("cooperation", self.cooperation),
            ("aggression", self.aggression),
            ("risk_tolerance", self.risk_tolerance),
            ("industriousness", self.industriousness),
            ("sociability", self.sociability),
            ("honesty", self.honesty),
            ("loyalty", self.loyalty),
            ("paranoia", self.paranoia),
        ]
    }
}

// ---------------------------------------------------------------------------
// Vitals / Mood / Goal / Delta-Log
// ---------------------------------------------------------------------------

/// Hunger and fatigue, each in `[0, 1]`. Both monotonically increase toward
/// `1.0` between ticks via [`crate::structs::ClockTick`]-driven decay; any
/// decrease happens only through `AgentState::applyAction` effects such as
/// eating or resting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub hunger: f64,
    pub fatigue: f64,
}

impl Vitals {
    /// A freshly created agent starts well-rested and fed.
    #[must_use]
    pub const fn fresh() -> Self {
        Self {
            hunger: 0.0,
            fatigue: 0.0,
        }
    }
}

/// Current affective state. `arousal` and `valence` are bounded `[0, 1]`;
/// `label` is a short human-readable tag derived by the Oracle (e.g.
/// `"content"`, `"wary"`, `"afraid"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub label: String,
    pub arousal: f64,
    pub valence: f64,
}

impl Mood {
    /// The neutral starting mood for a newly initialized agent.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            label: "calm".to_string(),
            arousal: 0.3,
            valence: 0.5,
        }
    }
}

/// A goal an agent is pursuing autonomously between interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub description: String,
    /// Progress toward completion, `[0, 1]`.
    pub progress: f64,
    pub abandoned: bool,
    pub abandon_reason: Option<String>,
}

impl Goal {
    /// Create a fresh, unstarted goal.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            progress: 0.0,
            abandoned: false,
            abandon_reason: None,
        }
    }
}

/// Append-only audit entry for one personality trait mutation (spec's
/// Delta-Log). Testable property 3 requires exactly one of these per trait
/// actually changed in a completed interaction, with `from + delta == to`
/// within soft-clamp tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaLogEntry {
    pub trait_name: String,
    pub from: f64,
    pub to: f64,
    pub delta: f64,
    pub reason: String,
    pub at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A zone-scoped 3D position, as written by Boundary location updates and
/// consumed by Proximity (spec §4.9). Agents with no reported location are
/// excluded from nearby queries but otherwise fully functional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePosition {
    pub zone: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The full mutable state of one simulated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub role: String,
    pub location: Option<ZonePosition>,
    pub personality: Personality,
    pub vitals: Vitals,
    pub mood: Mood,
    pub faction: Option<FactionId>,
    pub goals: Vec<Goal>,
    pub voice_fingerprint: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last time this agent was in active conversation or otherwise acted
    /// on; drives [`crate::enums::Tier`] classification.
    pub last_active_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Memory / Rumor
// ---------------------------------------------------------------------------

/// Who or what a memory or rumor is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum SubjectId {
    Player(PlayerId),
    Agent(AgentId),
}

/// A single memory held by an agent about a player or another agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: MemoryId,
    pub owner_agent: AgentId,
    pub subject: SubjectId,
    pub category: MemoryCategory,
    pub content: String,
    /// `[0, 1]`; decays exponentially, reinforced on retrieval.
    pub strength: f64,
    /// `[0, 1]`; higher values slow decay.
    pub emotional_weight: f64,
    pub created_at: DateTime<Utc>,
    pub last_referenced_at: DateTime<Utc>,
    pub ref_count: u32,
    /// Present for secondhand memories inserted by [`crate::structs::Memory`]
    /// sharing (gossip); `None` for firsthand memories. Secondhand memories
    /// never upgrade to firsthand.
    pub source: Option<AgentId>,
}

impl Memory {
    /// Memories below this strength are hidden from retrieval (spec §3).
    pub const FORGOTTEN_THRESHOLD: f64 = 0.05;
    /// Memories below this strength are scheduled for deletion in the next
    /// cleanup sweep.
    pub const DELETION_THRESHOLD: f64 = 0.01;

    /// Retrieval-ordering score: `strength * (1 + 0.5 * emotionalWeight)`.
    #[must_use]
    pub fn retrieval_score(&self) -> f64 {
        self.strength * (1.0 + 0.5 * self.emotional_weight)
    }

    /// Whether this memory is still eligible to appear in retrieval.
    #[must_use]
    pub fn is_retrievable(&self) -> bool {
        self.strength >= Self::FORGOTTEN_THRESHOLD
    }
}

/// A piece of gossip about a player or agent, propagated between agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    pub id: RumorId,
    pub about: SubjectId,
    pub content: String,
    pub created_by: AgentId,
    pub strength: f64,
    pub spread_set: BTreeSet<AgentId>,
}

// ---------------------------------------------------------------------------
// Relation / Reputation
// ---------------------------------------------------------------------------

/// A directed trust relationship from `agent_a` toward `agent_b`, with a
/// familiarity value that both directed records for the same unordered pair
/// must keep in sync (symmetric per spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub agent_a: AgentId,
    pub agent_b: AgentId,
    /// `[-1, 1]`, directed: how much `agent_a` trusts `agent_b`.
    pub trust: f64,
    /// `[0, 1]`, symmetric.
    pub familiarity: f64,
    pub last_interaction_at: DateTime<Utc>,
}

/// A player's standing with one agent, `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentReputation {
    pub player_id: PlayerId,
    pub agent_id: AgentId,
    pub value: f64,
}

/// A player's standing with one faction, `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionReputation {
    pub player_id: PlayerId,
    pub faction_id: FactionId,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Faction / Territory / TradeRoute / Battle
// ---------------------------------------------------------------------------

/// One faction's standing toward another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactionRelation {
    pub score: f64,
    pub label: FactionRelationLabel,
}

/// A faction: a group identity agents can belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub values: Vec<String>,
    pub relations: BTreeMap<FactionId, FactionRelation>,
    pub resources: BTreeMap<String, Decimal>,
}

/// A territory controlled (or contested) by a faction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    pub controlling_faction: FactionId,
    pub control_strength: f64,
    pub strategic_value: f64,
    pub contested: bool,
}

/// A trade route between two territories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRoute {
    pub id: TradeRouteId,
    pub from: TerritoryId,
    pub to: TerritoryId,
    pub goods: String,
    pub profit_margin: f64,
    pub risk_level: f64,
    pub status: TradeRouteStatus,
    pub total_trades: u64,
}

/// An ongoing or resolved battle between two factions over a territory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Battle {
    pub id: BattleId,
    pub territory: TerritoryId,
    pub attacker: FactionId,
    pub defender: FactionId,
    pub attacker_str: f64,
    pub defender_str: f64,
    pub status: BattleStatus,
    pub casualties: f64,
}

// ---------------------------------------------------------------------------
// Quest
// ---------------------------------------------------------------------------

/// A quest an agent may offer a player, sometimes generated from memories
/// the agent holds about that player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub giver_agent: AgentId,
    pub quest_type: String,
    pub title: String,
    pub description: String,
    pub difficulty: f64,
    pub expires_at: DateTime<Utc>,
    pub rewards: BTreeMap<String, u32>,
    pub status: QuestStatus,
}

// ---------------------------------------------------------------------------
// ConversationGroup
// ---------------------------------------------------------------------------

/// One turn in a group conversation, produced by a group-prompt Oracle call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTurn {
    pub speaker: AgentId,
    pub response_type: ResponseType,
    pub addressed_to: Option<AgentId>,
    pub dialogue: String,
}

/// A multi-agent conversation anchored to one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationGroup {
    pub id: GroupId,
    pub participants: BTreeSet<AgentId>,
    pub player_id: PlayerId,
    pub location: Option<ZonePosition>,
    pub history: Vec<GroupTurn>,
    /// `[0, 1]`.
    pub tension: f64,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WorldTime
// ---------------------------------------------------------------------------

/// Strictly monotonic simulated-world clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldTime {
    pub day: u64,
    pub hour: u32,
    pub minute: u32,
    /// Total simulated hours elapsed since world start; the single
    /// monotonic counter everything else is derived from.
    pub total_hours: u64,
}

impl WorldTime {
    /// The zero point of simulated time.
    #[must_use]
    pub const fn epoch() -> Self {
        Self {
            day: 0,
            hour: 0,
            minute: 0,
            total_hours: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// CognitiveFrame
// ---------------------------------------------------------------------------

/// A topic extracted from one cognition call, ready to become a new memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedTopic {
    pub category: MemoryCategory,
    pub content: String,
}

/// The structured output of one Brain call (spec §4.5/§4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveFrame {
    pub reflection: String,
    pub dialogue: String,
    pub intent: Intent,
    pub mood_shift_arousal: f64,
    pub mood_shift_valence: f64,
    /// `[0, 1]`.
    pub urgency: f64,
    /// `[-0.2, 0.2]`.
    pub trust_delta: f64,
    /// `[0, 1]`.
    pub emotional_weight: f64,
    pub extracted_topics: Vec<ExtractedTopic>,
}

impl CognitiveFrame {
    /// Build the frame returned when the Oracle times out or returns
    /// malformed output: neutral dialogue, no trust movement, no mood
    /// movement -- a safe no-op (spec §4.5).
    ///
    /// Takes `_mood` for signature symmetry with the real parsing path,
    /// but deliberately ignores it: `mood_shift_*` is added onto the
    /// agent's current mood by the caller, so seeding the shift from the
    /// mood itself would double it instead of leaving it unchanged.
    #[must_use]
    pub fn fallback(_mood: &Mood) -> Self {
        Self {
            reflection: String::new(),
            dialogue: "...".to_string(),
            intent: Intent::Ignore,
            mood_shift_arousal: 0.0,
            mood_shift_valence: 0.0,
            urgency: 0.0,
            trust_delta: 0.0,
            emotional_weight: 0.0,
            extracted_topics: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// World event log
// ---------------------------------------------------------------------------

/// One entry in the bounded world-event ring buffer (latest 1000, spec §4.7).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: EventId,
    pub world_time: WorldTime,
    pub kind: String,
    pub summary: String,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_retrieval_score_weights_emotional_weight() {
        let base = DateTime::<Utc>::UNIX_EPOCH;
        let memory = Memory {
            id: MemoryId::new(),
            owner_agent: AgentId::new(),
            subject: SubjectId::Player(PlayerId::new()),
            category: MemoryCategory::Event,
            content: "saw a fire".to_string(),
            strength: 0.8,
            emotional_weight: 1.0,
            created_at: base,
            last_referenced_at: base,
            ref_count: 0,
            source: None,
        };
        assert!((memory.retrieval_score() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn forgotten_memories_are_not_retrievable() {
        let base = DateTime::<Utc>::UNIX_EPOCH;
        let memory = Memory {
            id: MemoryId::new(),
            owner_agent: AgentId::new(),
            subject: SubjectId::Agent(AgentId::new()),
            category: MemoryCategory::Secret,
            content: "old gossip".to_string(),
            strength: 0.01,
            emotional_weight: 0.0,
            created_at: base,
            last_referenced_at: base,
            ref_count: 0,
            source: None,
        };
        assert!(!memory.is_retrievable());
    }

    #[test]
    fn fallback_frame_has_zero_trust_delta() {
        let mood = Mood::neutral();
        let frame = CognitiveFrame::fallback(&mood);
        assert_eq!(frame.trust_delta, 0.0);
        assert_eq!(frame.dialogue, "...");
        assert!(frame.extracted_topics.is_empty());
    }

    #[test]
    fn world_time_epoch_is_totally_ordered() {
        let later = WorldTime {
            day: 0,
            hour: 1,
            minute: 0,
            total_hours: 1,
        };
        assert!(WorldTime::epoch() < later);
    }
}
