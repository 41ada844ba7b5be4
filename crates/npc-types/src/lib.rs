//! Shared type definitions for the NPC simulation engine.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate boundary in the workspace: ids, enums, and the entity structs that
//! make up the data model.
//!
//! # Modules
//!
//! - [`ids`] -- type-safe UUID wrappers for every entity identifier
//! - [`enums`] -- tagged enumerations (intent, response type, category, ...)
//! - [`structs`] -- core entity structs (agent, memory, faction, ...)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BattleStatus, ErrorKind, FactionEventKind, FactionRelationLabel, Intent, MemoryCategory,
    QuestStatus, ResponseType, Tier, TradeRouteStatus,
};
pub use ids::{
    AgentId, BattleId, EventId, FactionId, GroupId, MemoryId, PlayerId, QuestId, RumorId,
    TerritoryId, TradeRouteId,
};
pub use structs::{
    Agent, AgentReputation, Battle, CognitiveFrame, ConversationGroup, DeltaLogEntry,
    ExtractedTopic, Faction, FactionReputation, FactionRelation, Goal, GroupTurn, Memory, Mood,
    Personality, Quest, Relation, Rumor, SubjectId, Territory, TradeRoute, Vitals, WorldEvent,
    WorldTime, ZonePosition, TRAIT_CEILING, TRAIT_FLOOR,
};
