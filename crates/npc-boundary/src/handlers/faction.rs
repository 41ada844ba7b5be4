//! `/factions`, `/territory/*`, `/battle/*`, and `/traderoute*` handlers
//! (spec §6): faction world reads and the player-facing battle/trade
//! operations layered on [`npc_core::faction::FactionEngine`].

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use npc_types::{Battle, BattleId, Faction, Territory, TradeRoute, TradeRouteId, TradeRouteStatus};
use validator::Validate;

use crate::dto::{BeginBattleQuery, EstablishRouteRequest, RouteIdRequest};
use crate::error::BoundaryError;
use crate::state::AppState;

/// `GET /factions`.
pub async fn list_factions(State(state): State<Arc<AppState>>) -> Json<Vec<Faction>> {
    let simulation = state.simulation.lock().await;
    Json(simulation.factions.factions().cloned().collect())
}

/// `GET /territory/control`.
pub async fn list_territories(State(state): State<Arc<AppState>>) -> Json<Vec<Territory>> {
    let simulation = state.simulation.lock().await;
    Json(simulation.factions.territories().copied().collect())
}

/// `GET /traderoutes`.
pub async fn list_trade_routes(State(state): State<Arc<AppState>>) -> Json<Vec<TradeRoute>> {
    let simulation = state.simulation.lock().await;
    Json(simulation.factions.trade_routes().cloned().collect())
}

/// `POST /territory/{t}/battle?attacker=&attacker_str=&defender_str=`: open
/// a battle for a contested territory. Strengths default to `1.0` (parity)
/// when the caller omits them.
pub async fn begin_battle(
    State(state): State<Arc<AppState>>,
    Path(territory_id): Path<npc_types::TerritoryId>,
    Query(query): Query<BeginBattleQuery>,
) -> Result<Json<Battle>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let territory = *simulation
        .factions
        .territory(territory_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("territory {territory_id}")))?;
    let defender = territory.controlling_faction;
    let attacker = query.attacker;
    if attacker == defender {
        return Err(BoundaryError::InvalidArgument("a faction cannot attack its own territory".to_owned()));
    }
    simulation
        .factions
        .faction(attacker)
        .ok_or_else(|| BoundaryError::NotFound(format!("faction {attacker}")))?;

    let battle = Battle {
        id: npc_types::BattleId::new(),
        territory: territory_id,
        attacker,
        defender,
        attacker_str: query.attacker_str,
        defender_str: query.defender_str,
        status: npc_types::BattleStatus::InProgress,
        casualties: 0.0,
    };
    simulation.factions.upsert_battle(battle);
    Ok(Json(battle))
}

/// `POST /battle/{id}/resolve`: force-resolve an in-progress battle.
pub async fn resolve_battle(
    State(state): State<Arc<AppState>>,
    Path(battle_id): Path<BattleId>,
) -> Result<Json<Battle>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    simulation.factions.force_resolve_battle(battle_id)?;
    let battle = *simulation
        .factions
        .battle(battle_id)
        .ok_or_else(|| BoundaryError::NotFound(format!("battle {battle_id}")))?;
    Ok(Json(battle))
}

/// `POST /traderoute/establish`.
pub async fn establish_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EstablishRouteRequest>,
) -> Result<Json<TradeRoute>, BoundaryError> {
    body.validate()?;
    let mut simulation = state.simulation.lock().await;
    for territory_id in [body.from, body.to] {
        simulation
            .factions
            .territory(territory_id)
            .ok_or_else(|| BoundaryError::NotFound(format!("territory {territory_id}")))?;
    }

    let route = TradeRoute {
        id: TradeRouteId::new(),
        from: body.from,
        to: body.to,
        goods: body.goods,
        profit_margin: body.profit_margin,
        risk_level: body.risk_level,
        status: TradeRouteStatus::Active,
        total_trades: 0,
    };
    simulation.factions.upsert_trade_route(route.clone());
    Ok(Json(route))
}

/// `POST /traderoute/execute`: force one successful trade outside the
/// once-a-day roll schedule.
pub async fn execute_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RouteIdRequest>,
) -> Result<Json<TradeRoute>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let route = simulation
        .factions
        .trade_route_mut(body.route)
        .ok_or_else(|| BoundaryError::NotFound(format!("trade route {}", body.route)))?;
    if route.status != TradeRouteStatus::Active {
        return Err(BoundaryError::InvalidArgument(format!("trade route {} is not active", body.route)));
    }
    route.total_trades += 1;
    Ok(Json(route.clone()))
}

/// `POST /traderoute/disrupt`.
pub async fn disrupt_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RouteIdRequest>,
) -> Result<Json<TradeRoute>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let route = simulation
        .factions
        .trade_route_mut(body.route)
        .ok_or_else(|| BoundaryError::NotFound(format!("trade route {}", body.route)))?;
    route.status = TradeRouteStatus::Disrupted;
    Ok(Json(route.clone()))
}

/// `POST /traderoute/restore`.
pub async fn restore_route(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RouteIdRequest>,
) -> Result<Json<TradeRoute>, BoundaryError> {
    let mut simulation = state.simulation.lock().await;
    let route = simulation
        .factions
        .trade_route_mut(body.route)
        .ok_or_else(|| BoundaryError::NotFound(format!("trade route {}", body.route)))?;
    if route.status != TradeRouteStatus::Disrupted {
        return Err(BoundaryError::InvalidArgument(format!("trade route {} is not disrupted", body.route)));
    }
    route.status = TradeRouteStatus::Active;
    Ok(Json(route.clone()))
}
