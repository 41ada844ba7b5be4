//! Faction engine: per-tick relation drift, battle advancement, trade route
//! rolls, and faction events (spec §4.11).

use std::collections::{BTreeMap, BTreeSet};

use npc_types::{
    Battle, BattleId, BattleStatus, Faction, FactionEventKind, FactionId, FactionRelation,
    FactionRelationLabel, Territory, TerritoryId, TradeRoute, TradeRouteId, TradeRouteStatus,
};
use rand::Rng;
use rust_decimal::Decimal;

use crate::config::FactionConfig;

/// Attrition applied to both sides of an in-progress battle each tick, as a
/// fraction of the opponent's current effective strength.
const BATTLE_ATTRITION_RATE: f64 = 0.05;

/// A faction's relation score decays toward 0 at this ratio per elapsed
/// `relation_half_life_hours`, unless pinned by an event this tick.
const HALF_LIFE_DECAY_BASE: f64 = 0.5;

/// `skirmish`/`trade_deal`/`betrayal`/`alliance_formed` deltas, applied to
/// the relation score of the ordered pair the event names.
const EVENT_DELTA_SKIRMISH: f64 = -0.15;
const EVENT_DELTA_TRADE_DEAL: f64 = 0.08;
const EVENT_DELTA_BETRAYAL: f64 = -0.35;
const EVENT_DELTA_ALLIANCE_FORMED: f64 = 0.25;

/// Errors from faction engine operations.
#[derive(Debug, thiserror::Error)]
pub enum FactionError {
    /// Referenced a faction id this engine has no record of.
    #[error("unknown faction: {0}")]
    UnknownFaction(FactionId),

    /// Referenced a territory id this engine has no record of.
    #[error("unknown territory: {0}")]
    UnknownTerritory(TerritoryId),

    /// Referenced a battle id this engine has no record of.
    #[error("unknown battle: {0}")]
    UnknownBattle(BattleId),

    /// An event named the same faction as both sides.
    #[error("faction event must name two distinct factions, got {0} twice")]
    SelfEvent(FactionId),
}

/// The outcome of advancing one battle by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// The battle is still in progress.
    Ongoing,
    /// The attacker's effective strength fell below the resolution
    /// threshold; the defender holds the territory.
    DefenderWon,
    /// The defender's effective strength fell below the resolution
    /// threshold; `controllingFaction` transfers to the attacker.
    AttackerWon,
}

/// A trade route's roll result for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeRollOutcome {
    /// The route did not roll this tick (not yet a new simulated day).
    NotDue,
    /// The route succeeded; both endpoint agents accrue resources.
    Success,
    /// The route failed but remains active.
    FailedRemainsActive,
    /// The route failed and transitioned to `disrupted`.
    Disrupted,
}

/// Owns the mutable faction-level world state and advances it one tick at a
/// time.
#[derive(Debug, Default)]
pub struct FactionEngine {
    factions: BTreeMap<FactionId, Faction>,
    territories: BTreeMap<TerritoryId, Territory>,
    trade_routes: BTreeMap<TradeRouteId, TradeRoute>,
    battles: BTreeMap<BattleId, Battle>,
    last_trade_roll_day: BTreeMap<TradeRouteId, u64>,
    /// Faction pairs an event mutated since the last `tick` call; their
    /// decay is skipped for the next drift pass.
    pinned: BTreeSet<(FactionId, FactionId)>,
}

/// A summary of what one `tick` call did, for the caller to fold into the
/// bounded world-event ring (spec §4.7 step 6).
#[derive(Debug, Clone, Default)]
pub struct FactionTickReport {
    pub battles_resolved: Vec<(BattleId, BattleOutcome)>,
    pub trade_rolls: Vec<(TradeRouteId, TradeRollOutcome)>,
}

impl FactionEngine {
    /// An engine with no factions, territories, routes, or battles yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a faction's record.
    pub fn upsert_faction(&mut self, faction: Faction) {
        self.factions.insert(faction.id, faction);
    }

    /// Register or replace a territory's record.
    pub fn upsert_territory(&mut self, territory: Territory) {
        self.territories.insert(territory.id, territory);
    }

    /// Register or replace a trade route's record.
    pub fn upsert_trade_route(&mut self, route: TradeRoute) {
        self.trade_routes.insert(route.id, route);
    }

    /// Start (or replace) a battle record.
    pub fn upsert_battle(&mut self, battle: Battle) {
        self.battles.insert(battle.id, battle);
    }

    /// Read a faction's current record.
    #[must_use]
    pub fn faction(&self, id: FactionId) -> Option<&Faction> {
        self.factions.get(&id)
    }

    /// Read a territory's current record.
    #[must_use]
    pub fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    /// Read a battle's current record.
    #[must_use]
    pub fn battle(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    /// Read a trade route's current record.
    #[must_use]
    pub fn trade_route(&self, id: TradeRouteId) -> Option<&TradeRoute> {
        self.trade_routes.get(&id)
    }

    /// Mutable access to a trade route's record, for the manual
    /// execute/disrupt/restore operations (spec §6 `POST
    /// /traderoute/{execute,disrupt,restore}`) that act outside the
    /// once-a-day [`FactionEngine::roll_trade_routes`] schedule.
    pub fn trade_route_mut(&mut self, id: TradeRouteId) -> Option<&mut TradeRoute> {
        self.trade_routes.get_mut(&id)
    }

    /// Iterate every registered faction, for listing endpoints.
    pub fn factions(&self) -> impl Iterator<Item = &Faction> {
        self.factions.values()
    }

    /// Iterate every registered territory, for listing endpoints.
    pub fn territories(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    /// Iterate every registered trade route, for listing endpoints.
    pub fn trade_routes(&self) -> impl Iterator<Item = &TradeRoute> {
        self.trade_routes.values()
    }

    /// Iterate every battle record, in-progress or resolved.
    pub fn battles(&self) -> impl Iterator<Item = &Battle> {
        self.battles.values()
    }

    /// Force-resolve an in-progress battle immediately, bypassing the
    /// per-tick attrition schedule (spec §6 `POST /battle/{id}/resolve`).
    ///
    /// Compares current effective strengths the same way
    /// [`FactionEngine::advance_battles`] does for its resolution check, but
    /// decides a winner outright rather than requiring the loser's strength
    /// to have collapsed below the threshold. Ties favor the defender.
    ///
    /// # Errors
    ///
    /// Returns [`FactionError::UnknownBattle`] if `id` is not registered, or
    /// re-returns [`BattleOutcome::Ongoing`] wrapped in `Ok` if the battle
    /// was already resolved (a no-op).
    pub fn force_resolve_battle(&mut self, id: BattleId) -> Result<BattleOutcome, FactionError> {
        let battle = self.battles.get_mut(&id).ok_or(FactionError::UnknownBattle(id))?;
        if battle.status != BattleStatus::InProgress {
            return Ok(BattleOutcome::Ongoing);
        }

        let territory_bonus = self
            .territories
            .get(&battle.territory)
            .map_or(0.0, |t| t.control_strength);
        let defender_effective = battle.defender_str * (1.0 + territory_bonus);

        let outcome = if battle.attacker_str >= defender_effective {
            battle.status = BattleStatus::AttackerWon;
            if let Some(territory) = self.territories.get_mut(&battle.territory) {
                territory.controlling_faction = battle.attacker;
            }
            BattleOutcome::AttackerWon
        } else {
            battle.status = BattleStatus::DefenderWon;
            BattleOutcome::DefenderWon
        };
        Ok(outcome)
    }

    /// Apply a discrete faction event (spec §4.11): mutate the relation
    /// score between `a` and `b` by the event's deterministic delta and
    /// pin the pair against this tick's decay pass.
    ///
    /// # Errors
    ///
    /// Returns [`FactionError::UnknownFaction`] if either faction is
    /// unregistered, or [`FactionError::SelfEvent`] if `a == b`.
    pub fn apply_event(
        &mut self,
        kind: FactionEventKind,
        a: FactionId,
        b: FactionId,
    ) -> Result<(), FactionError> {
        if a == b {
            return Err(FactionError::SelfEvent(a));
        }
        if !self.factions.contains_key(&a) {
            return Err(FactionError::UnknownFaction(a));
        }
        if !self.factions.contains_key(&b) {
            return Err(FactionError::UnknownFaction(b));
        }

        let delta = match kind {
            FactionEventKind::Skirmish => EVENT_DELTA_SKIRMISH,
            FactionEventKind::TradeDeal => EVENT_DELTA_TRADE_DEAL,
            FactionEventKind::Betrayal => EVENT_DELTA_BETRAYAL,
            FactionEventKind::AllianceFormed => EVENT_DELTA_ALLIANCE_FORMED,
        };

        adjust_relation(&mut self.factions, a, b, delta)?;
        adjust_relation(&mut self.factions, b, a, delta)?;
        self.pinned.insert(ordered_pair(a, b));
        Ok(())
    }

    /// Advance all relation drift, in-progress battles, and due trade
    /// routes by one tick.
    ///
    /// `delta_hours` is the simulated time this tick covers (from
    /// [`crate::clock::WorldClock`]); `current_day` is the resulting
    /// [`npc_types::WorldTime::day`], used to gate trade route rolls to
    /// once per simulated day.
    pub fn tick(
        &mut self,
        delta_hours: f64,
        current_day: u64,
        config: &FactionConfig,
        rng: &mut impl Rng,
    ) -> FactionTickReport {
        self.decay_relations(delta_hours, config);
        self.pinned.clear();

        let battles_resolved = self.advance_battles();
        let trade_rolls = self.roll_trade_routes(current_day, rng);

        FactionTickReport {
            battles_resolved,
            trade_rolls,
        }
    }

    fn decay_relations(&mut self, delta_hours: f64, config: &FactionConfig) {
        if !delta_hours.is_finite() || delta_hours <= 0.0 || config.relation_half_life_hours == 0 {
            return;
        }
        let half_life = config.relation_half_life_hours as f64;
        let decay = HALF_LIFE_DECAY_BASE.powf(delta_hours / half_life);

        let pinned = self.pinned.clone();
        for (&faction_id, faction) in &mut self.factions {
            for (&other_id, relation) in &mut faction.relations {
                if pinned.contains(&ordered_pair(faction_id, other_id)) {
                    continue;
                }
                relation.score *= decay;
                relation.label = FactionRelationLabel::from_score(relation.score);
            }
        }
    }

    fn advance_battles(&mut self) -> Vec<(BattleId, BattleOutcome)> {
        let mut resolved = Vec::new();
        for (&battle_id, battle) in &mut self.battles {
            if battle.status != BattleStatus::InProgress {
                continue;
            }

            let territory_bonus = self
                .territories
                .get(&battle.territory)
                .map_or(0.0, |t| t.control_strength);

            let attacker_effective = battle.attacker_str;
            let defender_effective = battle.defender_str * (1.0 + territory_bonus);

            let attacker_losses = (defender_effective * BATTLE_ATTRITION_RATE).max(0.0);
            let defender_losses = (attacker_effective * BATTLE_ATTRITION_RATE).max(0.0);

            battle.attacker_str = (battle.attacker_str - attacker_losses).max(0.0);
            battle.defender_str = (battle.defender_str - defender_losses).max(0.0);
            battle.casualties += attacker_losses + defender_losses;

            let outcome = if battle.attacker_str < 0.4 * battle.defender_str.max(f64::MIN_POSITIVE) {
                battle.status = BattleStatus::DefenderWon;
                BattleOutcome::DefenderWon
            } else if battle.defender_str < 0.4 * battle.attacker_str.max(f64::MIN_POSITIVE) {
                battle.status = BattleStatus::AttackerWon;
                BattleOutcome::AttackerWon
            } else {
                BattleOutcome::Ongoing
            };

            if outcome == BattleOutcome::AttackerWon
                && let Some(territory) = self.territories.get_mut(&battle.territory)
            {
                territory.controlling_faction = battle.attacker;
            }

            if !matches!(outcome, BattleOutcome::Ongoing) {
                resolved.push((battle_id, outcome));
            }
        }
        resolved
    }

    fn roll_trade_routes(
        &mut self,
        current_day: u64,
        rng: &mut impl Rng,
    ) -> Vec<(TradeRouteId, TradeRollOutcome)> {
        let mut rolls = Vec::new();
        for (&route_id, route) in &mut self.trade_routes {
            if route.status != TradeRouteStatus::Active {
                continue;
            }
            let due = self
                .last_trade_roll_day
                .get(&route_id)
                .is_none_or(|&last| current_day > last);
            if !due {
                rolls.push((route_id, TradeRollOutcome::NotDue));
                continue;
            }
            self.last_trade_roll_day.insert(route_id, current_day);

            let success_prob = (1.0 - route.risk_level).clamp(0.0, 1.0);
            let roll: f64 = rng.random();
            let outcome = if roll < success_prob {
                route.total_trades = route.total_trades.saturating_add(1);
                TradeRollOutcome::Success
            } else {
                let disrupt_prob = (route.risk_level * route.risk_level).clamp(0.0, 1.0);
                if rng.random::<f64>() < disrupt_prob {
                    route.status = TradeRouteStatus::Disrupted;
                    TradeRollOutcome::Disrupted
                } else {
                    TradeRollOutcome::FailedRemainsActive
                }
            };
            rolls.push((route_id, outcome));
        }
        rolls
    }

    /// Resources an agent on a successful trade roll accrues, proportional
    /// to the route's `profit_margin`. Exposed separately from
    /// [`FactionEngine::tick`] so the caller (which owns agent resource
    /// bookkeeping) decides how to credit the endpoint agents.
    #[must_use]
    pub fn trade_profit(route: &TradeRoute, base_amount: Decimal) -> Decimal {
        let margin = Decimal::try_from(route.profit_margin.clamp(0.0, 1.0)).unwrap_or_default();
        base_amount * margin
    }
}

fn ordered_pair(a: FactionId, b: FactionId) -> (FactionId, FactionId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn adjust_relation(
    factions: &mut BTreeMap<FactionId, Faction>,
    owner: FactionId,
    other: FactionId,
    delta: f64,
) -> Result<(), FactionError> {
    let faction = factions.get_mut(&owner).ok_or(FactionError::UnknownFaction(owner))?;
    let entry = faction.relations.entry(other).or_insert(FactionRelation {
        score: 0.0,
        label: FactionRelationLabel::Neutral,
    });
    entry.score = (entry.score + delta).clamp(-1.0, 1.0);
    entry.label = FactionRelationLabel::from_score(entry.score);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn faction(id: FactionId, relations: Vec<(FactionId, f64)>) -> Faction {
        Faction {
            id,
            name: "test".to_owned(),
            values: Vec::new(),
            relations: relations
                .into_iter()
                .map(|(other, score)| {
                    (
                        other,
                        FactionRelation {
                            score,
                            label: FactionRelationLabel::from_score(score),
                        },
                    )
                })
                .collect(),
            resources: BTreeMap::new(),
        }
    }

    #[test]
    fn relations_decay_toward_zero_over_half_life() {
        let a = FactionId::new();
        let b = FactionId::new();
        let mut engine = FactionEngine::new();
        engine.upsert_faction(faction(a, vec![(b, 0.8)]));
        engine.upsert_faction(faction(b, vec![(a, 0.8)]));

        let cfg = FactionConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        engine.tick(48.0, 2, &cfg, &mut rng);

        let score = engine.faction(a).unwrap().relations.get(&b).unwrap().score;
        assert!((score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn pinned_relation_skips_decay_this_tick() {
        let a = FactionId::new();
        let b = FactionId::new();
        let mut engine = FactionEngine::new();
        engine.upsert_faction(faction(a, vec![]));
        engine.upsert_faction(faction(b, vec![]));

        engine.apply_event(FactionEventKind::AllianceFormed, a, b).unwrap();
        let before = engine.faction(a).unwrap().relations.get(&b).unwrap().score;

        let cfg = FactionConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        engine.tick(48.0, 1, &cfg, &mut rng);

        let after = engine.faction(a).unwrap().relations.get(&b).unwrap().score;
        assert!((before - after).abs() < 1e-9);
    }

    #[test]
    fn self_event_is_rejected() {
        let a = FactionId::new();
        let mut engine = FactionEngine::new();
        engine.upsert_faction(faction(a, vec![]));
        assert!(engine.apply_event(FactionEventKind::Skirmish, a, a).is_err());
    }

    #[test]
    fn battle_resolves_when_one_side_collapses() {
        let attacker = FactionId::new();
        let defender = FactionId::new();
        let territory_id = TerritoryId::new();
        let battle_id = BattleId::new();

        let mut engine = FactionEngine::new();
        engine.upsert_territory(Territory {
            id: territory_id,
            controlling_faction: defender,
            control_strength: 0.0,
            strategic_value: 1.0,
            contested: true,
        });
        engine.upsert_battle(Battle {
            id: battle_id,
            territory: territory_id,
            attacker,
            defender,
            attacker_str: 100.0,
            defender_str: 1.0,
            status: BattleStatus::InProgress,
            casualties: 0.0,
        });

        let cfg = FactionConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let report = engine.tick(1.0, 1, &cfg, &mut rng);

        assert_eq!(report.battles_resolved.len(), 1);
        assert_eq!(report.battles_resolved[0].1, BattleOutcome::AttackerWon);
        assert_eq!(engine.territory(territory_id).unwrap().controlling_faction, attacker);
    }

    #[test]
    fn trade_route_rolls_once_per_day() {
        let from = TerritoryId::new();
        let to = TerritoryId::new();
        let route_id = TradeRouteId::new();
        let mut engine = FactionEngine::new();
        engine.upsert_trade_route(TradeRoute {
            id: route_id,
            from,
            to,
            goods: "grain".to_owned(),
            profit_margin: 0.2,
            risk_level: 0.1,
            status: TradeRouteStatus::Active,
            total_trades: 0,
        });

        let cfg = FactionConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let first = engine.tick(1.0, 1, &cfg, &mut rng);
        assert_ne!(first.trade_rolls[0].1, TradeRollOutcome::NotDue);

        let same_day = engine.tick(1.0, 1, &cfg, &mut rng);
        assert_eq!(same_day.trade_rolls[0].1, TradeRollOutcome::NotDue);

        let next_day = engine.tick(1.0, 2, &cfg, &mut rng);
        assert_ne!(next_day.trade_rolls[0].1, TradeRollOutcome::NotDue);
    }

    #[test]
    fn high_risk_route_can_disrupt_on_failure() {
        let route_id = TradeRouteId::new();
        let mut engine = FactionEngine::new();
        engine.upsert_trade_route(TradeRoute {
            id: route_id,
            from: TerritoryId::new(),
            to: TerritoryId::new(),
            goods: "steel".to_owned(),
            profit_margin: 0.5,
            risk_level: 1.0,
            status: TradeRouteStatus::Active,
            total_trades: 0,
        });

        let cfg = FactionConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let report = engine.tick(1.0, 1, &cfg, &mut rng);
        assert_eq!(report.trade_rolls[0].1, TradeRollOutcome::Disrupted);
    }
}
