//! `/world/*` handlers (spec §6): autorun control, manual/advance ticks,
//! and the bounded world-event ring read.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use npc_core::tick;
use npc_events::OutboundMessage;
use serde::Serialize;

use crate::dto::{EventsQuery, StartQuery};
use crate::error::BoundaryError;
use crate::state::AppState;

/// `POST /world/start?time_scale=T&tick_interval=S`: `WorldClock.run(T,S)`.
///
/// The autorun loop itself runs once, spawned by `npc-engine` at process
/// startup; this only flips [`npc_core::operator::OperatorState`] so that
/// loop resumes issuing ticks.
pub async fn start(State(state): State<Arc<AppState>>, Query(query): Query<StartQuery>) -> Json<npc_core::operator::AutorunStatus> {
    state.operator.start(query.time_scale, query.tick_interval);
    Json(state.operator.status())
}

/// `POST /world/stop`: `WorldClock.halt`. The in-flight tick, if any,
/// finishes; no tick-generated world event is appended afterward.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<npc_core::operator::AutorunStatus> {
    state.operator.stop();
    Json(state.operator.status())
}

/// `GET /world/status`: autorun status, for operator dashboards.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<npc_core::operator::AutorunStatus> {
    Json(state.operator.status())
}

/// JSON-serializable projection of [`tick::TickSummary`] returned by the
/// manual tick endpoints.
#[derive(Debug, Serialize)]
pub struct TickResponse {
    pub tick_index: u64,
    pub world_time: Option<npc_types::WorldTime>,
    pub agents_processed: usize,
    pub gossip_events: usize,
    pub battles_resolved: usize,
    pub quests_expired: usize,
}

impl From<tick::TickSummary> for TickResponse {
    fn from(summary: tick::TickSummary) -> Self {
        Self {
            tick_index: summary.tick_index,
            world_time: summary.world_time,
            agents_processed: summary.agents_processed,
            gossip_events: summary.gossip_events,
            battles_resolved: summary.faction_report.battles_resolved.len(),
            quests_expired: summary.quests_expired.len(),
        }
    }
}

/// `POST /world/tick`: a single manual tick, advancing by
/// [`npc_core::config::TimeConfig::manual_tick_hours`].
pub async fn manual_tick(State(state): State<Arc<AppState>>) -> Result<Json<TickResponse>, BoundaryError> {
    let hours = state.configs.time.manual_tick_hours;
    run_one_tick(&state, hours).await
}

/// `POST /world/advance/{hours}`: advance by an explicit number of
/// simulated hours.
pub async fn advance(
    State(state): State<Arc<AppState>>,
    Path(hours): Path<f64>,
) -> Result<Json<TickResponse>, BoundaryError> {
    run_one_tick(&state, hours).await
}

async fn run_one_tick(state: &Arc<AppState>, hours: f64) -> Result<Json<TickResponse>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let summary = tick::run_tick(&mut simulation, &state.configs.tick_configs(), hours)?;

    let newly_appended: Vec<npc_types::WorldEvent> =
        simulation.world_events.iter().rev().take(summary.events_appended).cloned().collect();
    drop(simulation);
    for event in newly_appended.into_iter().rev() {
        state.publish(OutboundMessage::WorldEvent(event));
    }

    Ok(Json(summary.into()))
}

/// `GET /world/events?limit=N`: bounded ring read.
pub async fn world_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<npc_types::WorldEvent>> {
    let simulation = state.simulation.lock().await;
    Json(npc_events::log::ring_read(&simulation.world_events, query.limit.unwrap_or(0)))
}
