//! Enumerations shared across the workspace.
//!
//! Every tagged field the simulation produces or consumes is an explicit
//! enum rather than a freeform string, so that parsing a cognitive frame is
//! schema validation rather than field-probing.

use serde::{Deserialize, Serialize};

/// What an agent intends to do, as decided by a [`crate::structs::CognitiveFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Investigate,
    Guard,
    Trade,
    Assist,
    Flee,
    Attack,
    Socialize,
    Ignore,
}

/// How a participant in a group conversation responds to the current turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    DirectReply,
    Agreement,
    Disagreement,
    Elaboration,
    Interruption,
    Redirect,
    /// Filtered out before effects are applied; never appears in a returned order.
    Silent,
}

/// Category tag on a [`crate::structs::Memory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    Family,
    Goal,
    Fear,
    Event,
    Secret,
    Preference,
    Origin,
    Profession,
    Crime,
}

/// Qualitative label derived from a faction relation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionRelationLabel {
    Allied,
    Friendly,
    Neutral,
    Unfriendly,
    Hostile,
    AtWar,
}

impl FactionRelationLabel {
    /// Derive the label from a relation score in `[-1, 1]`, per spec §3 Faction.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.6 {
            Self::Allied
        } else if score >= 0.2 {
            Self::Friendly
        } else if score > -0.2 {
            Self::Neutral
        } else if score > -0.6 {
            Self::Unfriendly
        } else if score > -0.85 {
            Self::Hostile
        } else {
            Self::AtWar
        }
    }
}

/// Status of a [`crate::structs::TradeRoute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRouteStatus {
    Active,
    Disrupted,
    Retired,
}

/// Status of a [`crate::structs::Battle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
    InProgress,
    AttackerWon,
    DefenderWon,
}

/// Status of a [`crate::structs::Quest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Available,
    Accepted,
    Completed,
    Expired,
}

/// A discrete faction-level event that mutates relation scores by a
/// deterministic delta (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionEventKind {
    Skirmish,
    TradeDeal,
    Betrayal,
    AllianceFormed,
}

/// Per-agent work class driving tick frequency (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Active,
    Nearby,
    Idle,
    Dormant,
}

/// Stable error-kind tag surfaced in the `{error: {kind, ...}}` response body
/// (spec §7). Boundary maps these to HTTP status codes; this crate only
/// carries the tag so every crate agrees on its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AgentUnknown,
    AgentUninitialized,
    OracleTimeout,
    OracleMalformed,
    StoreUnavailable,
    TierBudgetExceeded,
    InvalidArgument,
    GroupClosed,
    RateLimited,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_label_thresholds_cover_full_range() {
        assert_eq!(FactionRelationLabel::from_score(1.0), FactionRelationLabel::Allied);
        assert_eq!(FactionRelationLabel::from_score(0.3), FactionRelationLabel::Friendly);
        assert_eq!(FactionRelationLabel::from_score(0.0), FactionRelationLabel::Neutral);
        assert_eq!(FactionRelationLabel::from_score(-0.3), FactionRelationLabel::Unfriendly);
        assert_eq!(FactionRelationLabel::from_score(-0.7), FactionRelationLabel::Hostile);
        assert_eq!(FactionRelationLabel::from_score(-1.0), FactionRelationLabel::AtWar);
    }

    #[test]
    fn intent_roundtrips_through_json() {
        let json = serde_json::to_string(&Intent::Socialize).unwrap_or_default();
        assert_eq!(json, "\"socialize\"");
        let back: Intent = serde_json::from_str(&json).unwrap_or(Intent::Ignore);
        assert_eq!(back, Intent::Socialize);
    }
}
