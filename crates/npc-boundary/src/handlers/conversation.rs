//! `/conversation/*` handlers (spec §6, §4.10): group lifecycle and
//! multi-speaker turn-taking, one [`Brain::interact_in_group`] call per
//! participant the orchestrator ranks into the turn order.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use npc_core::brain::{Brain, BrainRequest};
use npc_core::group::SalienceInputs;
use npc_types::{AgentId, ConversationGroup, GroupTurn, PlayerId, ZonePosition};
use validator::Validate;

use crate::dto::{ConversationMessageRequest, ConversationRosterRequest, EndConversationRequest, StartConversationRequest};
use crate::error::BoundaryError;
use crate::handlers::npc::apply_brain_outcome;
use crate::state::AppState;

/// `POST /conversation/start`.
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartConversationRequest>,
) -> Result<Json<ConversationGroup>, BoundaryError> {
    body.validate()?;
    let now = Utc::now();

    let mut simulation = state.simulation.lock().await;
    for agent_id in &body.npc_ids {
        if !simulation.agents.contains_key(agent_id) {
            return Err(BoundaryError::NotFound(format!("agent {agent_id}")));
        }
    }

    let mut groups = state.groups.lock().await;
    let group_id = groups.start(body.player_id, body.npc_ids.into_iter().collect(), body.location, now)?;
    for &agent_id in &groups.get(group_id)?.participants {
        simulation.agents_in_conversation.insert(agent_id);
    }
    Ok(Json(groups.get(group_id)?.clone()))
}

/// `POST /conversation/message`: rank participants by salience, then run
/// each through [`Brain::interact_in_group`] in turn, folding every
/// speaker's effects back into `SimulationState` before the next speaks.
pub async fn message(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConversationMessageRequest>,
) -> Result<Json<Vec<GroupTurn>>, BoundaryError> {
    body.validate()?;
    let now = Utc::now();

    let mut simulation = state.simulation.lock().await;
    let world_time = simulation.clock.now();
    let mut groups = state.groups.lock().await;

    let (player_id, order) = {
        let group = groups.get(body.group)?;
        let player_id = group.player_id;
        let group_tension_history = group.history.clone();
        let config = state.configs.group.clone();
        let order = groups.turn_order(body.group, &config, |agent_id| {
            salience_inputs_for(&simulation, agent_id, player_id, &group_tension_history)
        })?;
        (player_id, order)
    };

    let mut transcript: Vec<GroupTurn> = Vec::new();
    for agent_id in order {
        let agent_faction = simulation.agents.get(&agent_id).and_then(|a| a.agent.faction);
        let mut memory_candidates = simulation.agent_memories.remove(&agent_id).unwrap_or_default();
        let rumor_candidates = simulation.rumors.get(&agent_id).cloned().unwrap_or_default();
        let faction = agent_faction.and_then(|id| simulation.factions.faction(id)).cloned();
        let reputation_with_player = *simulation.reputations.entry((player_id, agent_id)).or_insert(0.0);
        let reputation_with_faction =
            agent_faction.map(|faction_id| *simulation.faction_reputations.entry((player_id, faction_id)).or_insert(0.0));

        let brain = Brain::new(&state.oracle, state.configs.memory.clone());
        let request = BrainRequest {
            player_id,
            utterance: &body.utterance,
            memory_candidates: &mut memory_candidates,
            rumor_candidates: &rumor_candidates,
            faction: faction.as_ref(),
            reputation_with_player,
            reputation_with_faction,
        };

        let Some(agent_state) = simulation.agents.get_mut(&agent_id) else {
            simulation.agent_memories.insert(agent_id, memory_candidates);
            continue;
        };
        let (turn, outcome) = brain.interact_in_group(agent_state, request, world_time, now, &transcript).await;

        simulation.agent_memories.insert(agent_id, memory_candidates);
        apply_brain_outcome(&mut simulation, agent_id, player_id, &outcome);

        if let Some(event) = outcome.world_event.clone() {
            state.publish(npc_events::OutboundMessage::WorldEvent(event));
        }

        groups.record_turn(body.group, turn.clone(), &transcript, now)?;
        transcript.push(turn);
    }

    // Silent turns stay in `transcript` so later speakers in this same
    // call still see them as context, but the response is the ordered
    // list of entries a player actually hears (spec §4.10 step 2).
    let visible_turns: Vec<GroupTurn> =
        transcript.into_iter().filter(|turn| turn.response_type != npc_types::ResponseType::Silent).collect();
    Ok(Json(visible_turns))
}

fn salience_inputs_for(
    simulation: &npc_core::tick::SimulationState,
    agent_id: AgentId,
    player_id: PlayerId,
    history: &[GroupTurn],
) -> SalienceInputs {
    let reputation = simulation.reputations.get(&(player_id, agent_id)).copied().unwrap_or(0.0);
    let familiarity = (reputation + 1.0) / 2.0;
    let personality = simulation.agents.get(&agent_id).map(|a| a.agent.personality.clone());
    let interest = personality.as_ref().map_or(0.5, |p| p.curiosity);
    let paranoia = personality.as_ref().map_or(0.5, |p| p.paranoia);
    let ticks_since_last_spoke = history
        .iter()
        .rev()
        .position(|t| t.speaker == agent_id)
        .map_or(u32::MAX, |index| u32::try_from(index).unwrap_or(u32::MAX));

    SalienceInputs {
        familiarity,
        interest,
        paranoia,
        ticks_since_last_spoke,
    }
}

/// `POST /conversation/add-npc`.
pub async fn add_npc(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConversationRosterRequest>,
) -> Result<(), BoundaryError> {
    let now = Utc::now();
    let mut simulation = state.simulation.lock().await;
    if !simulation.agents.contains_key(&body.agent) {
        return Err(BoundaryError::NotFound(format!("agent {}", body.agent)));
    }
    let mut groups = state.groups.lock().await;
    groups.add_agent(body.group, body.agent, now)?;
    simulation.agents_in_conversation.insert(body.agent);
    Ok(())
}

/// `POST /conversation/remove-npc`.
pub async fn remove_npc(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConversationRosterRequest>,
) -> Result<(), BoundaryError> {
    let now = Utc::now();
    let mut groups = state.groups.lock().await;
    groups.remove_agent(body.group, body.agent, now)?;
    if groups.get(body.group).map(|g| g.participants.is_empty()).unwrap_or(true) {
        drop(groups);
        let mut simulation = state.simulation.lock().await;
        simulation.agents_in_conversation.remove(&body.agent);
    }
    Ok(())
}

/// `POST /conversation/end`.
pub async fn end(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EndConversationRequest>,
) -> Result<Json<ConversationGroup>, BoundaryError> {
    let mut groups = state.groups.lock().await;
    let group = groups.end(body.group)?;

    let mut simulation = state.simulation.lock().await;
    for agent_id in &group.participants {
        simulation.agents_in_conversation.remove(agent_id);
    }
    Ok(Json(group))
}

/// `POST /conversation/location/npc/{id}`: `ProximityIndex.update`.
pub async fn update_npc_location(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<AgentId>,
    Json(position): Json<ZonePosition>,
) -> Result<(), BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    if !simulation.agents.contains_key(&agent_id) {
        return Err(BoundaryError::NotFound(format!("agent {agent_id}")));
    }
    simulation.proximity.update(agent_id, position);
    Ok(())
}

/// `POST /conversation/location/player/{id}`: the proximity index only
/// tracks agents, so player positions live in [`AppState::player_positions`]
/// instead.
pub async fn update_player_location(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<PlayerId>,
    Json(position): Json<ZonePosition>,
) -> Json<()> {
    let mut positions = state.player_positions.lock().await;
    positions.insert(player_id, position);
    Json(())
}
