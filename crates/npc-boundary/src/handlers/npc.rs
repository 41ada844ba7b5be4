//! `/npc/*` and `/memory/decay` handlers (spec §6): agent creation,
//! interactive cognition, status reads, and memory maintenance.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use npc_agents::agent_state::AgentState;
use npc_agents::memory;
use npc_core::brain::{Brain, BrainRequest};
use npc_types::{Agent, AgentId, PlayerId, SubjectId, Vitals};
use validator::Validate;

use crate::dto::{DecayQuery, InitAgentRequest, InitAgentResponse, ListAgentsQuery, MemoriesQuery, NpcActionRequest, NpcActionResponse};
use crate::error::BoundaryError;
use crate::state::AppState;

/// `POST /npc/init`.
pub async fn init_agent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<InitAgentRequest>,
) -> Result<Json<InitAgentResponse>, BoundaryError> {
    body.validate()?;
    let now = Utc::now();
    let agent = Agent {
        id: AgentId::new(),
        role: body.role,
        location: body.location,
        personality: body.personality.into(),
        vitals: Vitals::fresh(),
        mood: npc_types::Mood::neutral(),
        faction: None,
        goals: Vec::new(),
        voice_fingerprint: body.voice_fingerprint,
        created_at: now,
        last_active_at: now,
    };
    let agent_id = agent.id;

    let mut simulation = state.simulation.lock().await;
    simulation.agents.insert(agent_id, AgentState::new(agent));
    simulation.agent_memories.insert(agent_id, Vec::new());

    Ok(Json(InitAgentResponse { agent_id }))
}

/// `POST /npc/action`: `Brain.process(agent, player, text)`.
pub async fn npc_action(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<AgentId>,
    Json(body): Json<NpcActionRequest>,
) -> Result<Json<NpcActionResponse>, BoundaryError> {
    body.validate()?;
    let now = Utc::now();

    let mut simulation = state.simulation.lock().await;
    let world_time = simulation.clock.now();

    if !simulation.agents.contains_key(&agent_id) {
        return Err(BoundaryError::NotFound(format!("agent {agent_id}")));
    }
    let agent_faction = simulation.agents.get(&agent_id).and_then(|a| a.agent.faction);

    let mut memory_candidates = simulation.agent_memories.remove(&agent_id).unwrap_or_default();
    let rumor_candidates = simulation.rumors.get(&agent_id).cloned().unwrap_or_default();
    let faction = agent_faction.and_then(|id| simulation.factions.faction(id)).cloned();
    let reputation_with_player = *simulation.reputations.entry((body.player_id, agent_id)).or_insert(0.0);
    let reputation_with_faction =
        agent_faction.map(|faction_id| *simulation.faction_reputations.entry((body.player_id, faction_id)).or_insert(0.0));

    let brain = Brain::new(&state.oracle, state.configs.memory.clone());
    let request = BrainRequest {
        player_id: body.player_id,
        utterance: &body.utterance,
        memory_candidates: &mut memory_candidates,
        rumor_candidates: &rumor_candidates,
        faction: faction.as_ref(),
        reputation_with_player,
        reputation_with_faction,
    };

    let agent_state = simulation
        .agents
        .get_mut(&agent_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("agent {agent_id}")))?;
    let outcome = brain.interact(agent_state, request, world_time, now).await;

    simulation.agent_memories.insert(agent_id, memory_candidates);
    apply_brain_outcome(&mut simulation, agent_id, body.player_id, &outcome);

    if let Some(event) = outcome.world_event.clone() {
        state.publish(npc_events::OutboundMessage::WorldEvent(event));
    }

    Ok(Json(NpcActionResponse {
        dialogue: outcome.frame.dialogue,
        intent: outcome.frame.intent,
        urgency: outcome.frame.urgency,
        trust_delta: outcome.frame.trust_delta,
    }))
}

/// Fold one [`npc_core::brain::BrainOutcome`] into `SimulationState`:
/// reinforce/insert memories, commit reputation deltas (and their faction
/// ripple), and log any urgent world event. Shared by the solo and group
/// interaction paths.
pub(crate) fn apply_brain_outcome(
    simulation: &mut npc_core::tick::SimulationState,
    agent_id: AgentId,
    player_id: PlayerId,
    outcome: &npc_core::brain::BrainOutcome,
) {
    if let Some(memories) = simulation.agent_memories.get_mut(&agent_id) {
        for (id, strength) in &outcome.reinforced_memory_ids {
            if let Some(memory) = memories.iter_mut().find(|m| m.id == *id) {
                memory.strength = *strength;
            }
        }
        memories.extend(outcome.new_memories.iter().cloned());
    }

    simulation.reputations.insert((player_id, agent_id), outcome.reputation.0);

    if let Some(agent_state) = simulation.agents.get(&agent_id)
        && let Some(faction_id) = agent_state.agent.faction
        && let Some((new_reputation, _)) = outcome.faction_reputation
    {
        simulation.faction_reputations.insert((player_id, faction_id), new_reputation);
    }

    for (&enemy_faction, &delta) in &outcome.faction_ripple {
        let entry = simulation.faction_reputations.entry((player_id, enemy_faction)).or_insert(0.0);
        *entry = (*entry + delta).clamp(-1.0, 1.0);
    }

    if let Some(event) = &outcome.world_event {
        simulation.push_world_event(event.clone());
    }
}

/// `GET /npc/status/{id}`: agent snapshot.
pub async fn agent_status(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<AgentId>,
) -> Result<Json<Agent>, BoundaryError> {
    let simulation = state.simulation.lock().await;
    let agent_state = simulation
        .agents
        .get(&agent_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("agent {agent_id}")))?;
    Ok(Json(agent_state.agent.clone()))
}

/// `GET /npc/list`: paginated list.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListAgentsQuery>,
) -> Json<Vec<Agent>> {
    let simulation = state.simulation.lock().await;
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100);
    let agents = simulation
        .agents
        .values()
        .skip(offset)
        .take(limit)
        .map(|a| a.agent.clone())
        .collect();
    Json(agents)
}

/// `GET /npc/memories/{agent}/{player}`: filtered memories.
pub async fn agent_memories(
    State(state): State<Arc<AppState>>,
    Path((agent_id, player_id)): Path<(AgentId, PlayerId)>,
    Query(query): Query<MemoriesQuery>,
) -> Result<Json<Vec<npc_types::Memory>>, BoundaryError> {
    let simulation = state.simulation.lock().await;
    let memories = simulation
        .agent_memories
        .get(&agent_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("agent {agent_id}")))?;

    let subject = SubjectId::Player(player_id);
    let mut filtered: Vec<npc_types::Memory> =
        memories.iter().filter(|m| m.subject == subject && !memory::is_forgotten(m)).cloned().collect();

    if let Some(limit) = query.limit {
        filtered.truncate(limit);
    }
    Ok(Json(filtered))
}

/// `POST /memory/decay?hours=H`: `MemoryEngine.decaySweep(H)`, run
/// immediately rather than waiting for the next autorun tick.
pub async fn decay_memories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DecayQuery>,
) -> Result<(), BoundaryError> {
    if !query.hours.is_finite() || query.hours < 0.0 {
        return Err(BoundaryError::InvalidArgument("hours must be a non-negative, finite number".to_owned()));
    }
    let mut simulation = state.simulation.lock().await;
    let memory_config = state.configs.memory.clone();
    for memories in simulation.agent_memories.values_mut() {
        memory::decay_sweep(memories, query.hours, &memory_config);
    }
    Ok(())
}
