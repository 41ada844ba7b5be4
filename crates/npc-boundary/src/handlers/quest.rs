//! `/quest/*` handlers (spec §6): generation via `Brain.quest()` and the
//! accept/complete state transitions.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use npc_core::brain::Brain;
use npc_types::{Quest, QuestId, QuestStatus};

use crate::dto::QuestGenerateQuery;
use crate::error::BoundaryError;
use crate::state::AppState;

/// `POST /quest/generate/{agent}?player_id=`: `Brain.quest()`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<npc_types::AgentId>,
    Query(query): Query<QuestGenerateQuery>,
) -> Result<Json<Quest>, BoundaryError> {
    let now = chrono::Utc::now();
    let mut simulation = state.simulation.lock().await;
    let world_time = simulation.clock.now();

    let agent = simulation
        .agents
        .get(&agent_id)
        .map(|a| a.agent.clone())
        .ok_or_else(|| BoundaryError::NotFound(format!("agent {agent_id}")))?;

    let subject = npc_types::SubjectId::Player(query.player_id);
    let memories_about_player: Vec<npc_types::Memory> = simulation
        .agent_memories
        .get(&agent_id)
        .map(|memories| memories.iter().filter(|m| m.subject == subject).cloned().collect())
        .unwrap_or_default();

    let brain = Brain::new(&state.oracle, state.configs.memory.clone());
    let quest = brain.quest(&agent, query.player_id, &memories_about_player, world_time, now).await;

    simulation.quests.insert(quest.id, quest.clone());
    Ok(Json(quest))
}

/// `POST /quest/accept/{id}`: `Available -> Accepted`.
pub async fn accept(State(state): State<Arc<AppState>>, Path(quest_id): Path<QuestId>) -> Result<Json<Quest>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let quest = simulation
        .quests
        .get_mut(&quest_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("quest {quest_id}")))?;
    if quest.status != QuestStatus::Available {
        return Err(BoundaryError::InvalidArgument(format!("quest {quest_id} is not available")));
    }
    quest.status = QuestStatus::Accepted;
    Ok(Json(quest.clone()))
}

/// `POST /quest/complete/{id}`: `Accepted -> Completed`.
pub async fn complete(State(state): State<Arc<AppState>>, Path(quest_id): Path<QuestId>) -> Result<Json<Quest>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let quest = simulation
        .quests
        .get_mut(&quest_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("quest {quest_id}")))?;
    if quest.status != QuestStatus::Accepted {
        return Err(BoundaryError::InvalidArgument(format!("quest {quest_id} is not accepted")));
    }
    quest.status = QuestStatus::Completed;
    Ok(Json(quest.clone()))
}
