//! Process entrypoint for the NPC simulation service.
//!
//! Wires configuration, durable storage, the Oracle, the in-process
//! simulation container, and the Boundary HTTP/WebSocket surface into one
//! running process, then drives the autorun tick loop until shutdown.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing, JSON output).
//! 2. Load layered configuration (defaults, `npc-engine.yaml`, env).
//! 3. Connect to Postgres and run migrations.
//! 4. Build the Oracle from its own environment-variable configuration.
//! 5. Assemble a fresh [`SimulationState`] and [`BoundaryConfigs`].
//! 6. Spawn the write-behind persistence queue.
//! 7. Spawn the Boundary HTTP server.
//! 8. Spawn the autorun tick loop.
//! 9. Wait for `SIGINT`/`SIGTERM`, then let the in-flight tick and any
//!    queued writes finish before exiting.

mod autorun;
mod config;
mod error;

use std::sync::Arc;

use npc_boundary::state::{AppState, BoundaryConfigs};
use npc_core::clock::WorldClock;
use npc_core::operator::OperatorState;
use npc_core::proximity::ProximityIndex;
use npc_core::tick::SimulationState;
use npc_events::nats::NatsFanout;
use npc_oracle::{Oracle, OracleConfig};
use npc_store::{PostgresConfig, PostgresPool, WriteBehindQueue};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::error::EngineError;

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("npc-engine starting");

    let engine_config = EngineConfig::load()?;
    info!(
        bind_port = engine_config.bind_port,
        time_scale = engine_config.time.time_scale,
        tick_interval_seconds = engine_config.time.tick_interval_seconds,
        "configuration loaded"
    );

    let postgres_config = PostgresConfig::new(&engine_config.database_url);
    let pool = PostgresPool::connect(&postgres_config).await?;
    if engine_config.run_migrations {
        pool.run_migrations().await?;
        info!("database migrations applied");
    }

    let oracle_config = OracleConfig::from_env()?;
    let oracle = Oracle::new(&oracle_config)?;
    info!("oracle initialized");

    let clock = WorldClock::new();
    let proximity = ProximityIndex::new(&engine_config.proximity)?;
    let simulation = SimulationState {
        clock,
        factions: npc_core::faction::FactionEngine::new(),
        proximity,
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

    let boundary_configs = BoundaryConfigs {
        time: engine_config.time,
        tiering: engine_config.tiering,
        proximity: engine_config.proximity,
        group: engine_config.group,
        faction: engine_config.faction,
        memory: npc_agents::config::MemoryConfig::default(),
        vitals: npc_agents::config::VitalsConfig::default(),
    };

    let tick_interval_ms = (engine_config.time.tick_interval_seconds * 1000.0).round() as u64;
    let operator = OperatorState::new(tick_interval_ms, engine_config.time.time_scale);

    let mut state = AppState::new(simulation, oracle, operator, boundary_configs);
    if let Some(nats_url) = &engine_config.nats_url {
        match NatsFanout::connect(nats_url).await {
            Ok(fanout) => {
                state = state.with_nats(fanout);
                info!(nats_url, "connected external event fan-out");
            }
            Err(err) => {
                tracing::warn!(%err, "failed to connect to NATS, external event fan-out disabled");
            }
        }
    }
    let state = Arc::new(state);

    let write_behind = WriteBehindQueue::with_defaults(Arc::new(pool.pool().clone()));

    let boundary_handle = npc_boundary::spawn_boundary(engine_config.bind_port, Arc::clone(&state)).await?;

    let autorun_state = Arc::clone(&state);
    let autorun_write_behind = write_behind.clone();
    let autorun_handle = tokio::spawn(async move {
        if let Err(err) = autorun::run(autorun_state, autorun_write_behind).await {
            tracing::error!(%err, "autorun loop exited with error");
        }
    });

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, stopping autorun and boundary server");

    state.operator.stop();
    autorun_handle.abort();
    boundary_handle.abort();

    info!("npc-engine shutdown complete");
    Ok(())
}

/// Wait for `SIGINT` (`Ctrl-C`) or, on Unix, `SIGTERM`.
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
