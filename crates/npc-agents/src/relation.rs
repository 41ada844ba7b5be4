//! Directed trust between agents, with symmetric familiarity (spec §3:
//! "`Relation` ... Symmetric only in familiarity; trust is directed").

use chrono::{DateTime, Utc};
use npc_types::{AgentId, Relation};

/// Build the ordered pair key two directed `Relation` records for the same
/// unordered agent pair must agree on for familiarity (spec §9: "cyclic
/// agent/relation references -> first-class `Relation` records keyed by
/// ordered id-pair").
#[must_use]
pub fn pair_key(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Record one interaction between `agent_a` and `agent_b`: nudge
/// `agent_a`'s directed trust toward `agent_b` by `trust_delta`, and raise
/// shared familiarity by `familiarity_gain`.
pub fn record_interaction(
    relation: &mut Relation,
    trust_delta: f64,
    familiarity_gain: f64,
    at: DateTime<Utc>,
) {
    relation.trust = (relation.trust + trust_delta).clamp(-1.0, 1.0);
    relation.familiarity = (relation.familiarity + familiarity_gain).clamp(0.0, 1.0);
    relation.last_interaction_at = at;
}

/// A freshly introduced pair: zero trust, zero familiarity.
#[must_use]
pub fn new_relation(agent_a: AgentId, agent_b: AgentId, at: DateTime<Utc>) -> Relation {
    Relation {
        agent_a,
        agent_b,
        trust: 0.0,
        familiarity: 0.0,
        last_interaction_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_key_is_order_independent() {
        let a = AgentId::new();
        let b = AgentId::new();
        assert_eq!(pair_key(a, b), pair_key(b, a));
    }

    #[test]
    fn record_interaction_clamps_both_fields() {
        let a = AgentId::new();
        let b = AgentId::new();
        let mut relation = new_relation(a, b, Utc::now());
        record_interaction(&mut relation, 5.0, 5.0, Utc::now());
        assert_eq!(relation.trust, 1.0);
        assert_eq!(relation.familiarity, 1.0);
        record_interaction(&mut relation, -5.0, -5.0, Utc::now());
        assert_eq!(relation.trust, -1.0);
        assert_eq!(relation.familiarity, 0.0);
    }
}
