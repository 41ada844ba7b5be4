//! Integration tests for the Boundary HTTP surface.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The Oracle is pointed at an unreachable backend
//! so `cognize` always falls back to [`npc_types::CognitiveFrame::fallback`]
//! rather than making a real LLM call -- this exercises the same
//! graceful-degradation path `npc-oracle`'s own tests cover, just from the
//! Boundary layer's side of the call.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use npc_core::clock::WorldClock;
use npc_core::config::{FactionConfig, GroupConfig, ProximityConfig, TieringConfig, TimeConfig};
use npc_core::faction::FactionEngine;
use npc_core::operator::OperatorState;
use npc_core::proximity::ProximityIndex;
use npc_core::tick::SimulationState;
use npc_agents::config::{MemoryConfig, VitalsConfig};
use npc_boundary::router::build_router;
use npc_boundary::state::{AppState, BoundaryConfigs};
use npc_oracle::config::{BackendType, LlmBackendConfig, OracleConfig};
use npc_oracle::Oracle;
use npc_types::{Faction, FactionId, Territory, TerritoryId};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Write the minimal `.j2` template set `PromptEngine` requires into a
/// fresh temp directory, so `Oracle::new` succeeds without shipping real
/// prompt templates in this test tree.
fn write_test_templates(dir: &std::path::Path) {
    std::fs::write(dir.join("system.j2"), "You are {{ agent_role }}.").ok();
    std::fs::write(dir.join("identity.j2"), "## Identity\nMood: {{ mood.label }}").ok();
    std::fs::write(dir.join("situation.j2"), "## Situation\n{{ utterance }}").ok();
    std::fs::write(dir.join("memory.j2"), "## Memories\n{% for m in memories %}- {{ m }}\n{% endfor %}").ok();
    std::fs::write(dir.join("response_format.j2"), "Respond as JSON.").ok();
}

fn test_oracle() -> Oracle {
    let unique = format!("npc_boundary_api_tests_{}_{:?}", std::process::id(), std::thread::current().id());
    let dir = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&dir).ok();
    write_test_templates(&dir);

    let config = OracleConfig {
        primary_backend: LlmBackendConfig {
            backend_type: BackendType::OpenAi,
            api_url: "http://127.0.0.1:1".to_owned(),
            api_key: "test".to_owned(),
            model: "test".to_owned(),
        },
        escalation_backend: None,
        tts_url: None,
        stt_url: None,
        templates_dir: dir.to_str().unwrap_or("").to_owned(),
        cognize_timeout: Duration::from_millis(50),
        synthesize_timeout: Duration::from_millis(50),
        transcribe_timeout: Duration::from_millis(50),
    };
    Oracle::new(&config).expect("test templates should load")
}

fn make_test_state() -> Arc<AppState> {
    let simulation = SimulationState {
        clock: WorldClock::with_seed(1),
        factions: FactionEngine::new(),
        proximity: ProximityIndex::new(&ProximityConfig::default()).expect("default proximity config is valid"),
        agents: std::collections::BTreeMap::new(),
        agent_memories: std::collections::BTreeMap::new(),
        relations: std::collections::BTreeMap::new(),
        quests: std::collections::BTreeMap::new(),
        world_events: std::collections::VecDeque::new(),
        tick_index: 0,
        agents_in_conversation: std::collections::BTreeSet::new(),
        reputations: std::collections::BTreeMap::new(),
        faction_reputations: std::collections::BTreeMap::new(),
        rumors: std::collections::BTreeMap::new(),
    };

    let configs = BoundaryConfigs {
        time: TimeConfig::default(),
        tiering: TieringConfig::default(),
        proximity: ProximityConfig::default(),
        group: GroupConfig::default(),
        faction: FactionConfig::default(),
        memory: MemoryConfig::default(),
        vitals: VitalsConfig::default(),
    };

    Arc::new(AppState::new(simulation, test_oracle(), OperatorState::new(5_000, 1.0), configs))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn init_agent_then_read_status() {
    let state = make_test_state();
    let router = build_router(state);

    let init_response = router
        .clone()
        .oneshot(
            Request::post("/npc/init")
                .header("content-type", "application/json")
                .body(Body::from(json!({"role": "watchman"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(init_response.status(), StatusCode::OK);
    let body = body_to_json(init_response.into_body()).await;
    let agent_id = body["agent_id"].as_str().unwrap().to_owned();

    let status_response = router
        .oneshot(Request::get(format!("/npc/status/{agent_id}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(status_response.status(), StatusCode::OK);
    let agent = body_to_json(status_response.into_body()).await;
    assert_eq!(agent["role"], "watchman");
}

#[tokio::test]
async fn init_agent_rejects_empty_role() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::post("/npc/init")
                .header("content-type", "application/json")
                .body(Body::from(json!({"role": ""}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn npc_action_against_unknown_agent_returns_not_found() {
    let state = make_test_state();
    let router = build_router(state);

    let fake_id = uuid::Uuid::now_v7();
    let response = router
        .oneshot(
            Request::post(format!("/npc/action/{fake_id}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"player_id": uuid::Uuid::now_v7(), "utterance": "hello"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["error"]["kind"], "agent_unknown");
}

#[tokio::test]
async fn npc_action_falls_back_when_oracle_unreachable() {
    let state = make_test_state();
    let router = build_router(state.clone());

    let init_response = router
        .clone()
        .oneshot(
            Request::post("/npc/init")
                .header("content-type", "application/json")
                .body(Body::from(json!({"role": "merchant"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let agent_id = body_to_json(init_response.into_body()).await["agent_id"].as_str().unwrap().to_owned();

    let action_response = router
        .oneshot(
            Request::post(format!("/npc/action/{agent_id}"))
                .header("content-type", "application/json")
                .body(Body::from(json!({"player_id": uuid::Uuid::now_v7(), "utterance": "Got any work?"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(action_response.status(), StatusCode::OK);
    let response = body_to_json(action_response.into_body()).await;
    assert!(response["dialogue"].is_string());
}

#[tokio::test]
async fn list_agents_reflects_inits() {
    let state = make_test_state();
    let router = build_router(state);

    for role in ["farmer", "guard"] {
        router
            .clone()
            .oneshot(
                Request::post("/npc/init")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"role": role}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
    }

    let response = router.oneshot(Request::get("/npc/list").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let agents = body_to_json(response.into_body()).await;
    assert_eq!(agents.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn world_status_starts_stopped_and_flips_on_start() {
    let state = make_test_state();
    let router = build_router(state);

    let status = router
        .clone()
        .oneshot(Request::get("/world/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = body_to_json(status.into_body()).await;
    assert_eq!(status["running"], false);

    let started = router
        .oneshot(Request::post("/world/start?time_scale=1.0&tick_interval=5").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(started.status(), StatusCode::OK);
    let started = body_to_json(started.into_body()).await;
    assert_eq!(started["running"], true);
}

#[tokio::test]
async fn manual_tick_advances_world_time() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router.oneshot(Request::post("/world/tick").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_to_json(response.into_body()).await;
    assert_eq!(summary["tick_index"], 1);
}

#[tokio::test]
async fn factions_and_territories_are_listed() {
    let state = make_test_state();
    {
        let mut simulation = state.simulation.lock().await;
        simulation.factions.upsert_faction(Faction {
            id: FactionId::new(),
            name: "The Wardens".to_owned(),
            values: vec!["order".to_owned()],
            relations: std::collections::BTreeMap::new(),
            resources: std::collections::BTreeMap::new(),
        });
    }

    let router = build_router(state);
    let response = router.oneshot(Request::get("/factions").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let factions = body_to_json(response.into_body()).await;
    assert_eq!(factions.as_array().unwrap().len(), 1);
    assert_eq!(factions[0]["name"], "The Wardens");
}

#[tokio::test]
async fn begin_battle_rejects_faction_attacking_its_own_territory() {
    let state = make_test_state();
    let faction_id = FactionId::new();
    let territory_id = TerritoryId::new();
    {
        let mut simulation = state.simulation.lock().await;
        simulation.factions.upsert_territory(Territory {
            id: territory_id,
            controlling_faction: faction_id,
            control_strength: 1.0,
            strategic_value: 0.5,
            contested: false,
        });
    }

    let router = build_router(state);
    let response = router
        .oneshot(
            Request::post(format!("/territory/{territory_id}/battle?attacker={faction_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quest_accept_rejects_quest_not_yet_generated() {
    let state = make_test_state();
    let router = build_router(state);

    let fake_quest = uuid::Uuid::now_v7();
    let response = router
        .oneshot(Request::post(format!("/quest/accept/{fake_quest}")).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn nonexistent_route_returns_404() {
    let state = make_test_state();
    let router = build_router(state);

    let response = router.oneshot(Request::get("/api/nonexistent").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
