//! The per-tick simulation pipeline (spec §4.7).
//!
//! [`run_tick`] executes the six steps in strict order -- advance the
//! clock, sweep memory decay, advance factions, process tiered agents,
//! sweep expired quests, append summarized events to the bounded world
//! event ring -- and returns a [`TickSummary`] the caller (the process
//! embedding this crate) folds into its observer/boundary layer.
//!
//! [`SimulationState`] bundles everything one tick touches. It holds no
//! connection to storage; the caller loads it from `npc-store` before the
//! tick and persists whatever changed afterward.

use std::collections::{BTreeMap, VecDeque};

use chrono::Utc;
use npc_agents::agent_state::AgentState;
use npc_agents::config::{MemoryConfig, VitalsConfig};
use npc_agents::memory;
use npc_agents::relation::pair_key;
use npc_types::{
    AgentId, EventId, FactionId, Memory, PlayerId, Quest, QuestId, QuestStatus, Relation, Rumor, SubjectId, Tier,
    WorldEvent, WorldTime,
};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::{FactionConfig, TieringConfig};
use crate::faction::{FactionEngine, FactionTickReport};
use crate::proximity::ProximityIndex;
use crate::tiering;

/// Longest the world-event ring is allowed to grow before the oldest
/// entries are dropped (spec §4.7 step 6: "bounded ring, latest 1000").
const WORLD_EVENT_RING_CAPACITY: usize = 1000;

/// Chance an `Active`-tier agent initiates gossip with a nearby partner on
/// a tick it is processed. Spec §4.7 names "a small probability" without a
/// value; `0.05` is chosen here and recorded in the grounding ledger.
const GOSSIP_PROBABILITY: f64 = 0.05;

/// Autonomous progress granted to an agent's oldest live goal per
/// simulated hour it is processed. Spec §4.7 names "autonomous goal
/// progression" without a rate; chosen here and recorded in the grounding
/// ledger.
const AUTONOMOUS_GOAL_PROGRESS_PER_HOUR: f64 = 0.02;

/// Radius, in world units, a gossip partner is drawn from. Matches
/// [`crate::config::ProximityConfig::nearby_radius`]'s default so gossip
/// reaches exactly the agents a `Nearby`-tier classification would count.
const GOSSIP_PARTNER_RADIUS: f64 = 10.0;

/// Errors from running one tick.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The world clock failed to advance.
    #[error("clock error: {0}")]
    Clock(#[from] crate::clock::ClockError),
}

/// Everything one call to [`run_tick`] reads and mutates.
///
/// Owned by the caller (`npc-engine`'s simulation loop), which is
/// responsible for loading it from `npc-store` before the tick and writing
/// back whatever [`run_tick`] changed.
#[derive(Debug)]
pub struct SimulationState {
    pub clock: crate::clock::WorldClock,
    pub factions: FactionEngine,
    pub proximity: ProximityIndex,
    pub agents: BTreeMap<AgentId, AgentState>,
    pub agent_memories: BTreeMap<AgentId, Vec<Memory>>,
    pub relations: BTreeMap<(AgentId, AgentId), Relation>,
    pub quests: BTreeMap<QuestId, Quest>,
    pub world_events: VecDeque<WorldEvent>,
    pub tick_index: u64,
    /// Agents currently holding the floor in a live conversation; tiering
    /// treats them as `Active` regardless of idle time.
    pub agents_in_conversation: std::collections::BTreeSet<AgentId>,
    /// `reputation(player, agent)`, `[-1, 1]`, read and written only by
    /// `Brain::interact`/`interact_in_group`; absent means `0.0`.
    pub reputations: BTreeMap<(PlayerId, AgentId), f64>,
    /// `reputation(player, faction)`, `[-1, 1]`, including faction-ripple
    /// updates; absent means `0.0`.
    pub faction_reputations: BTreeMap<(PlayerId, FactionId), f64>,
    /// Rumors each agent has heard, consulted by `Brain` as
    /// `rumor_candidates` and grown by gossip about a player.
    pub rumors: BTreeMap<AgentId, Vec<Rumor>>,
}

impl SimulationState {
    /// Push a world event onto the ring, dropping the oldest entry first if
    /// the ring is already at [`WORLD_EVENT_RING_CAPACITY`].
    pub fn push_world_event(&mut self, event: WorldEvent) {
        if self.world_events.len() >= WORLD_EVENT_RING_CAPACITY {
            self.world_events.pop_front();
        }
        self.world_events.push_back(event);
    }
}

/// Tunable knobs [`run_tick`] needs, bundled so the call site doesn't carry
/// five separate reference parameters.
#[derive(Debug, Clone, Copy)]
pub struct TickConfigs<'a> {
    pub tiering: &'a TieringConfig,
    pub faction: &'a FactionConfig,
    pub memory: &'a MemoryConfig,
    pub vitals: &'a VitalsConfig,
}

/// What happened during one `run_tick` call, for the caller to fold into
/// its own observer/event layer.
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub tick_index: u64,
    pub world_time: Option<WorldTime>,
    pub faction_report: FactionTickReport,
    pub agents_processed: usize,
    pub gossip_events: usize,
    pub quests_expired: Vec<QuestId>,
    pub events_appended: usize,
}

/// Advance the simulation by one tick (spec §4.7).
///
/// `delta_hours` is the simulated time this tick covers -- `Δh` for a
/// manual tick, or `timeScale` for an autorun tick.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if `delta_hours` is rejected by
/// [`crate::clock::WorldClock::advance`] (negative, non-finite, or rounds
/// to zero minutes).
pub fn run_tick(state: &mut SimulationState, configs: &TickConfigs<'_>, delta_hours: f64) -> Result<TickSummary, TickError> {
    let now = Utc::now();

    // 1. Advance WorldTime.
    let world_time = state.clock.advance(delta_hours)?;
    debug!(tick = state.tick_index, day = world_time.day, hour = world_time.hour, "tick: clock advanced");

    // 2. MemoryEngine.decaySweep(Δh).
    for memories in state.agent_memories.values_mut() {
        memory::decay_sweep(memories, delta_hours, configs.memory);
    }

    // 3. FactionEngine.tick(Δh).
    let faction_report = state.factions.tick(delta_hours, world_time.day, configs.faction, state.clock.rng_mut());
    if !faction_report.battles_resolved.is_empty() {
        info!(count = faction_report.battles_resolved.len(), "tick: battles resolved");
    }

    // 4. Per tiered agent: vitals decay, autonomous goal progression, gossip.
    let (agents_processed, gossip_events, gossip_world_events) = phase_agents(state, configs, world_time, now, delta_hours);
    for event in gossip_world_events {
        state.push_world_event(event);
    }

    // 5. Quest expiry sweep.
    let quests_expired = phase_quest_expiry(state, now);

    // 6. Append summarized events (battles/trade rolls/quest expiry) to the
    // bounded world-event ring.
    let events_appended = phase_log_events(state, world_time, now, &faction_report, &quests_expired);

    state.tick_index = state.tick_index.saturating_add(1);

    Ok(TickSummary {
        tick_index: state.tick_index,
        world_time: Some(world_time),
        faction_report,
        agents_processed,
        gossip_events,
        quests_expired,
        events_appended,
    })
}

fn phase_agents(
    state: &mut SimulationState,
    configs: &TickConfigs<'_>,
    world_time: WorldTime,
    now: chrono::DateTime<Utc>,
    delta_hours: f64,
) -> (usize, usize, Vec<WorldEvent>) {
    let agent_ids: Vec<AgentId> = state.agents.keys().copied().collect();
    let mut processed = 0usize;
    let mut gossip_events = 0usize;
    let mut emitted = Vec::new();

    for agent_id in agent_ids {
        let Some(agent_state) = state.agents.get(&agent_id) else { continue };
        let in_conversation = state.agents_in_conversation.contains(&agent_id);
        let near_player = !state.proximity.nearby(agent_id, GOSSIP_PARTNER_RADIUS).is_empty();
        let tier = tiering::classify(agent_state.agent.last_active_at, now, in_conversation, near_player, configs.tiering);

        if !tiering::is_due(tier, state.tick_index, configs.tiering) {
            continue;
        }
        processed += 1;

        if let Some(agent_state) = state.agents.get_mut(&agent_id) {
            agent_state.apply_vital_decay(delta_hours, configs.vitals);
        }

        if matches!(tier, Tier::Dormant) {
            // Dormant agents get a heartbeat only: no goal progression, no
            // cognition, no gossip (spec §4.8).
            continue;
        }

        if let Some(agent_state) = state.agents.get_mut(&agent_id)
            && let Some(goal) = agent_state.agent.goals.iter_mut().find(|g| !g.abandoned)
        {
            goal.progress = (goal.progress + AUTONOMOUS_GOAL_PROGRESS_PER_HOUR * delta_hours).clamp(0.0, 1.0);
        }

        if matches!(tier, Tier::Active) && state.clock.rng_mut().random::<f64>() < GOSSIP_PROBABILITY
            && let Some(event) = attempt_gossip(state, agent_id, configs.memory, world_time, now)
        {
            gossip_events += 1;
            emitted.push(event);
        }
    }

    (processed, gossip_events, emitted)
}

/// Have `agent_id` gossip with one relation-weighted nearby partner about
/// whichever subject its strongest memory concerns (spec §4.7 step 4,
/// §4.4 "Share"). Cross-agent mutation follows the fixed agent-id
/// ordering invariant (spec §5): the lower id's mailbox is touched first.
fn attempt_gossip(
    state: &mut SimulationState,
    agent_id: AgentId,
    memory_config: &MemoryConfig,
    world_time: WorldTime,
    now: chrono::DateTime<Utc>,
) -> Option<WorldEvent> {
    let candidates = state.proximity.nearby(agent_id, GOSSIP_PARTNER_RADIUS);
    if candidates.is_empty() {
        return None;
    }

    let partner = pick_gossip_partner(state, agent_id, &candidates)?;
    let from_memories = state.agent_memories.get(&agent_id)?;
    let subject = strongest_subject(from_memories)?;

    let key = pair_key(agent_id, partner);
    let trust_to_from = state
        .relations
        .get(&key)
        .map_or(0.0, |relation| if key.0 == partner { relation.trust } else { -relation.trust });

    let drafts = memory::share(from_memories, subject, trust_to_from.max(0.0), memory_config);
    if drafts.is_empty() {
        return None;
    }

    let new_memories: Vec<Memory> = drafts.into_iter().map(|draft| draft.into_memory(partner, agent_id, now)).collect();
    let shared_count = new_memories.len();
    state.agent_memories.entry(partner).or_default().extend(new_memories);

    Some(WorldEvent {
        id: EventId::new(),
        world_time,
        kind: "gossip".to_owned(),
        summary: format!("an agent shared {shared_count} memories with a nearby agent"),
        details: serde_json::json!({"from": agent_id, "to": partner, "shared": shared_count}),
        created_at: now,
    })
}

fn pick_gossip_partner(state: &SimulationState, agent_id: AgentId, candidates: &[AgentId]) -> Option<AgentId> {
    candidates
        .iter()
        .copied()
        .filter(|&candidate| candidate != agent_id && state.agents.contains_key(&candidate))
        .max_by(|&a, &b| {
            let weight = |other: AgentId| {
                state
                    .relations
                    .get(&pair_key(agent_id, other))
                    .map_or(0.0, |relation| relation.familiarity)
            };
            weight(a).total_cmp(&weight(b))
        })
}

fn strongest_subject(memories: &[Memory]) -> Option<SubjectId> {
    memories
        .iter()
        .filter(|m| !memory::is_forgotten(m))
        .max_by(|a, b| a.retrieval_score().total_cmp(&b.retrieval_score()))
        .map(|m| m.subject)
}

fn phase_quest_expiry(state: &mut SimulationState, now: chrono::DateTime<Utc>) -> Vec<QuestId> {
    let mut expired = Vec::new();
    for (id, quest) in &mut state.quests {
        if quest.status == QuestStatus::Available && quest.expires_at <= now {
            quest.status = QuestStatus::Expired;
            expired.push(*id);
        }
    }
    expired
}

fn phase_log_events(
    state: &mut SimulationState,
    world_time: WorldTime,
    now: chrono::DateTime<Utc>,
    faction_report: &FactionTickReport,
    quests_expired: &[QuestId],
) -> usize {
    let mut appended = 0usize;

    for (battle_id, outcome) in &faction_report.battles_resolved {
        state.push_world_event(WorldEvent {
            id: EventId::new(),
            world_time,
            kind: "battle_resolved".to_owned(),
            summary: format!("battle {battle_id} resolved: {outcome:?}"),
            details: serde_json::json!({"battle": battle_id, "outcome": format!("{outcome:?}")}),
            created_at: now,
        });
        appended += 1;
    }

    for id in quests_expired {
        state.push_world_event(WorldEvent {
            id: EventId::new(),
            world_time,
            kind: "quest_expired".to_owned(),
            summary: format!("quest {id} expired"),
            details: serde_json::json!({"quest": id}),
            created_at: now,
        });
        appended += 1;
    }

    if appended == 0 {
        warn!(tick = state.tick_index, "tick: no events appended");
    }

    appended
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use npc_types::{Agent, Mood, Personality, Vitals};

    use super::*;
    use crate::clock::WorldClock;

    fn sample_agent(id: AgentId, last_active_at: chrono::DateTime<Utc>) -> Agent {
        Agent {
            id,
            role: "villager".to_owned(),
            location: None,
            personality: Personality {
                curiosity: 0.5,
                cooperation: 0.5,
                aggression: 0.5,
                risk_tolerance: 0.5,
                industriousness: 0.5,
                sociability: 0.5,
                honesty: 0.5,
                loyalty: 0.5,
                paranoia: 0.5,
            },
            vitals: Vitals::fresh(),
            mood: Mood::neutral(),
            faction: None,
            goals: Vec::new(),
            voice_fingerprint: None,
            created_at: last_active_at,
            last_active_at,
        }
    }

    fn empty_state() -> SimulationState {
        SimulationState {
            clock: WorldClock::new(),
            factions: FactionEngine::new(),
            proximity: ProximityIndex::new(&crate::config::ProximityConfig::default()).unwrap(),
            agents: BTreeMap::new(),
            agent_memories: BTreeMap::new(),
            relations: BTreeMap::new(),
            quests: BTreeMap::new(),
            world_events: VecDeque::new(),
            tick_index: 0,
            agents_in_conversation: BTreeSet::new(),
            reputations: BTreeMap::new(),
            faction_reputations: BTreeMap::new(),
            rumors: BTreeMap::new(),
        }
    }

    fn configs<'a>(
        tiering: &'a TieringConfig,
        faction: &'a FactionConfig,
        memory: &'a MemoryConfig,
        vitals: &'a VitalsConfig,
    ) -> TickConfigs<'a> {
        TickConfigs { tiering, faction, memory, vitals }
    }

    #[test]
    fn run_tick_advances_clock_and_bumps_index() {
        let mut state = empty_state();
        let tiering = TieringConfig::default();
        let faction = FactionConfig::default();
        let memory = MemoryConfig::default();
        let vitals = VitalsConfig::default();
        let cfgs = configs(&tiering, &faction, &memory, &vitals);

        let summary = run_tick(&mut state, &cfgs, 1.0).unwrap();
        assert_eq!(summary.tick_index, 1);
        assert_eq!(summary.world_time.unwrap().total_hours, 1);
        assert_eq!(state.tick_index, 1);
    }

    #[test]
    fn active_agent_decays_vitals_and_progresses_goal() {
        let mut state = empty_state();
        let id = AgentId::new();
        let mut agent_state = AgentState::new(sample_agent(id, Utc::now()));
        agent_state.set_goal("gather wood");
        state.agents.insert(id, agent_state);

        let tiering = TieringConfig::default();
        let faction = FactionConfig::default();
        let memory = MemoryConfig::default();
        let vitals = VitalsConfig::default();
        let cfgs = configs(&tiering, &faction, &memory, &vitals);

        run_tick(&mut state, &cfgs, 1.0).unwrap();

        let updated = state.agents.get(&id).unwrap();
        assert!(updated.agent.vitals.hunger > 0.0);
        assert!(updated.agent.goals[0].progress > 0.0);
    }

    #[test]
    fn dormant_agent_only_gets_a_heartbeat() {
        let mut state = empty_state();
        let id = AgentId::new();
        let long_ago = Utc::now() - chrono::Duration::hours(2);
        let mut agent_state = AgentState::new(sample_agent(id, long_ago));
        agent_state.set_goal("gather wood");
        state.agents.insert(id, agent_state);

        let tiering = TieringConfig::default();
        let faction = FactionConfig::default();
        let memory = MemoryConfig::default();
        let vitals = VitalsConfig::default();
        let cfgs = configs(&tiering, &faction, &memory, &vitals);

        run_tick(&mut state, &cfgs, 1.0).unwrap();

        let updated = state.agents.get(&id).unwrap();
        assert!(updated.agent.vitals.hunger > 0.0);
        assert!((updated.agent.goals[0].progress).abs() < 1e-9);
    }

    #[test]
    fn quest_past_expiry_is_marked_expired() {
        let mut state = empty_state();
        let quest_id = QuestId::new();
        state.quests.insert(
            quest_id,
            Quest {
                id: quest_id,
                giver_agent: AgentId::new(),
                quest_type: "delivery".to_owned(),
                title: "Deliver the package".to_owned(),
                description: String::new(),
                difficulty: 0.5,
                expires_at: Utc::now() - chrono::Duration::hours(1),
                rewards: BTreeMap::new(),
                status: QuestStatus::Available,
            },
        );

        let tiering = TieringConfig::default();
        let faction = FactionConfig::default();
        let memory = MemoryConfig::default();
        let vitals = VitalsConfig::default();
        let cfgs = configs(&tiering, &faction, &memory, &vitals);

        let summary = run_tick(&mut state, &cfgs, 1.0).unwrap();
        assert_eq!(summary.quests_expired, vec![quest_id]);
        assert_eq!(state.quests.get(&quest_id).unwrap().status, QuestStatus::Expired);
    }

    #[test]
    fn world_event_ring_drops_oldest_past_capacity() {
        let mut state = empty_state();
        for _ in 0..(WORLD_EVENT_RING_CAPACITY + 10) {
            state.push_world_event(WorldEvent {
                id: EventId::new(),
                world_time: WorldTime::epoch(),
                kind: "test".to_owned(),
                summary: String::new(),
                details: serde_json::Value::Null,
                created_at: Utc::now(),
            });
        }
        assert_eq!(state.world_events.len(), WORLD_EVENT_RING_CAPACITY);
    }
}
