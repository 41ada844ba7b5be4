//! Player standing with agents and factions, including faction-ripple
//! propagation (spec §3, §4.6(d)).

use std::collections::BTreeMap;

use npc_types::{Faction, FactionId, FactionRelationLabel};

/// Multiplier applied to a faction-reputation change when it ripples into
/// enemy factions (spec §3: "`Δrep(p, f') += −η · Δrep(p, f)` for every
/// enemy `f'` of `f`"). The spec names the coefficient but not its value;
/// `0.3` is chosen here and recorded in the grounding ledger.
pub const ENEMY_RIPPLE_ETA: f64 = 0.3;

/// Multiplier applied when an agent-level trust delta ripples into the
/// player's standing with that agent's faction (spec §4.6(d)).
pub const FACTION_RIPPLE_FACTOR: f64 = 0.25;

/// Apply a delta to a reputation value, clamped to `[-1, 1]`. Returns the
/// delta actually applied (which may be smaller than requested near the
/// bound), for use as the source of further ripples.
#[must_use]
pub fn apply_delta(current: f64, delta: f64) -> (f64, f64) {
    let updated = (current + delta).clamp(-1.0, 1.0);
    (updated, updated - current)
}

/// Labels a faction's relation counts as an "enemy" for ripple purposes.
#[must_use]
pub fn is_enemy(label: FactionRelationLabel) -> bool {
    matches!(label, FactionRelationLabel::Hostile | FactionRelationLabel::AtWar)
}

/// Given a faction-reputation change of `applied_delta` toward `faction`,
/// compute the ripple deltas for every faction `faction` considers an
/// enemy (spec §3).
#[must_use]
pub fn ripple_to_enemies(faction: &Faction, applied_delta: f64) -> BTreeMap<FactionId, f64> {
    faction
        .relations
        .iter()
        .filter(|(_, relation)| is_enemy(relation.label))
        .map(|(enemy_id, _)| (*enemy_id, -ENEMY_RIPPLE_ETA * applied_delta))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use npc_types::FactionRelation;

    #[test]
    fn apply_delta_clamps_to_unit_interval() {
        let (value, applied) = apply_delta(0.9, 0.5);
        assert_eq!(value, 1.0);
        assert!((applied - 0.1).abs() < 1e-9);
    }

    #[test]
    fn ripple_only_touches_enemy_factions() {
        let mut relations = BTreeMap::new();
        let enemy = FactionId::new();
        let friend = FactionId::new();
        relations.insert(
            enemy,
            FactionRelation {
                score: -0.9,
                label: FactionRelationLabel::AtWar,
            },
        );
        relations.insert(
            friend,
            FactionRelation {
                score: 0.8,
                label: FactionRelationLabel::Allied,
            },
        );
        let faction = Faction {
            id: FactionId::new(),
            name: "Test".to_owned(),
            values: Vec::new(),
            relations,
            resources: BTreeMap::new(),
        };

        let ripples = ripple_to_enemies(&faction, 0.4);
        assert_eq!(ripples.len(), 1);
        assert!((ripples[&enemy] + ENEMY_RIPPLE_ETA * 0.4).abs() < 1e-9);
    }
}
