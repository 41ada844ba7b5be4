//! Axum router construction for the Boundary API (spec §6's full HTTP +
//! `WebSocket` surface).

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{conversation, faction, npc, quest, voice, world};
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Boundary server.
///
/// CORS allows any origin; this process sits behind a game server's own
/// edge, not exposed to browsers directly, so origin restriction is that
/// caller's job rather than this one's.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/ws/game", get(ws::game_socket))
        .route("/npc/init", post(npc::init_agent))
        .route("/npc/action/{id}", post(npc::npc_action))
        .route("/npc/status/{id}", get(npc::agent_status))
        .route("/npc/list", get(npc::list_agents))
        .route("/npc/memories/{agent}/{player}", get(npc::agent_memories))
        .route("/memory/decay", post(npc::decay_memories))
        .route("/world/start", post(world::start))
        .route("/world/stop", post(world::stop))
        .route("/world/status", get(world::status))
        .route("/world/tick", post(world::manual_tick))
        .route("/world/advance/{hours}", post(world::advance))
        .route("/world/events", get(world::world_events))
        .route("/quest/generate/{agent}", post(quest::generate))
        .route("/quest/accept/{id}", post(quest::accept))
        .route("/quest/complete/{id}", post(quest::complete))
        .route("/factions", get(faction::list_factions))
        .route("/territory/control", get(faction::list_territories))
        .route("/territory/{id}/battle", post(faction::begin_battle))
        .route("/battle/{id}/resolve", post(faction::resolve_battle))
        .route("/traderoutes", get(faction::list_trade_routes))
        .route("/traderoute/establish", post(faction::establish_route))
        .route("/traderoute/execute", post(faction::execute_route))
        .route("/traderoute/disrupt", post(faction::disrupt_route))
        .route("/traderoute/restore", post(faction::restore_route))
        .route("/conversation/start", post(conversation::start))
        .route("/conversation/message", post(conversation::message))
        .route("/conversation/end", post(conversation::end))
        .route("/conversation/add-npc", post(conversation::add_npc))
        .route("/conversation/remove-npc", post(conversation::remove_npc))
        .route("/conversation/location/npc/{id}", post(conversation::update_npc_location))
        .route("/conversation/location/player/{id}", post(conversation::update_player_location))
        .route("/voice/generate/{id}", post(voice::generate))
        .route("/speech/transcribe", post(voice::transcribe))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
