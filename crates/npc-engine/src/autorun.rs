//! Drives the autorun tick loop against the shared, lock-guarded
//! [`SimulationState`](npc_core::tick::SimulationState) the Boundary layer
//! also reads and writes.
//!
//! [`npc_core::runner::run_autorun`] takes `&mut SimulationState` for the
//! whole loop, which fits a process that owns the state exclusively. This
//! process shares it behind `AppState::simulation`'s `Mutex`, so this
//! module re-implements the same wait/tick/callback shape one lock
//! acquisition at a time, publishing the tick's new world events and
//! queuing each changed agent onto the write-behind queue exactly the way
//! `handlers/world.rs`'s `run_one_tick` does for a manual tick.

use std::sync::Arc;

use npc_core::tick;
use npc_events::OutboundMessage;
use npc_store::WriteBehindQueue;
use tracing::info;

use crate::error::EngineError;

/// Run the autorun loop until `operator` is told to stop permanently.
///
/// Unlike [`npc_core::runner::run_autorun`] this never returns on its own;
/// `npc-engine` aborts the task that runs this on shutdown. It returns
/// `Err` only if a tick itself fails, which `main` treats as fatal since
/// a broken tick pipeline cannot self-heal.
pub async fn run(state: Arc<npc_boundary::AppState>, write_behind: WriteBehindQueue) -> Result<(), EngineError> {
    loop {
        state.operator.wait_until_running().await;

        let delta_hours = state.operator.time_scale();
        // Every agent's vitals decay each tick, so every agent is dirty;
        // `WriteBehindQueue` coalesces these down to one write per agent
        // per flush window regardless.
        let (summary, newly_appended, dirty_agents) = {
            let mut simulation = state.simulation.lock().await;
            let summary = tick::run_tick(&mut simulation, &state.configs.tick_configs(), delta_hours)
                .map_err(npc_core::runner::RunnerError::from)?;
            let newly_appended: Vec<npc_types::WorldEvent> =
                simulation.world_events.iter().rev().take(summary.events_appended).cloned().collect();
            let dirty_agents: Vec<npc_types::Agent> =
                simulation.agents.values().map(|agent_state| agent_state.agent.clone()).collect();
            (summary, newly_appended, dirty_agents)
        };

        for event in newly_appended.into_iter().rev() {
            state.publish(OutboundMessage::WorldEvent(event));
        }
        for agent in dirty_agents {
            write_behind.submit(agent).await;
        }

        if !state.operator.is_running() {
            info!(tick = summary.tick_index, "autorun stopped; current tick finished");
        }
    }
}
