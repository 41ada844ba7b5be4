//! Autorun loop: drives [`tick::run_tick`] on a wall-clock interval while
//! [`OperatorState`] reports it should be running (spec §4.7, §6
//! `/world/start`, `/world/stop`).
//!
//! Manual ticks (`POST /world/tick`) bypass this module entirely and call
//! [`tick::run_tick`] directly from the Boundary handler; this loop exists
//! only for the autorun driving mode.

use std::sync::Arc;

use tracing::info;

use crate::operator::OperatorState;
use crate::tick::{self, SimulationState, TickConfigs, TickError, TickSummary};

/// Errors from the autorun loop.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Invoked after each autorun tick completes, so the caller can fold the
/// summary into its observer/event-bus layer.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op callback, useful in tests.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the autorun loop until `operator` reports a stop or the surrounding
/// task is cancelled (the latter is how a process shutdown ends this loop;
/// `npc-engine` aborts the task rather than threading a cancellation token
/// through every layer).
///
/// Before each tick this waits for [`OperatorState::wait_until_running`],
/// so a stopped autorun costs nothing. Per spec §5, "Autorun can be
/// stopped at any time; the current tick finishes" -- the running check
/// happens only between ticks, never inside one.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] if a tick execution fails.
pub async fn run_autorun(
    state: &mut SimulationState,
    configs: &TickConfigs<'_>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<(), RunnerError> {
    loop {
        operator.wait_until_running().await;

        let delta_hours = operator.time_scale();
        let summary = tick::run_tick(state, configs, delta_hours)?;
        callback.on_tick(&summary, state);

        if !operator.is_running() {
            info!(tick = summary.tick_index, "autorun stopped; current tick finished");
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, VecDeque};

    use npc_agents::config::{MemoryConfig, VitalsConfig};

    use super::*;
    use crate::clock::WorldClock;
    use crate::config::{FactionConfig, ProximityConfig, TieringConfig};
    use crate::faction::FactionEngine;
    use crate::proximity::ProximityIndex;

    fn empty_state() -> SimulationState {
        SimulationState {
            clock: WorldClock::new(),
            factions: FactionEngine::new(),
            proximity: ProximityIndex::new(&ProximityConfig::default()).unwrap(),
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

    #[tokio::test]
    async fn ticks_while_running_and_stops_issuing_after_stop() {
        let mut state = empty_state();
        let tiering = TieringConfig::default();
        let faction = FactionConfig::default();
        let memory = MemoryConfig::default();
        let vitals = VitalsConfig::default();
        let configs = TickConfigs { tiering: &tiering, faction: &faction, memory: &memory, vitals: &vitals };

        let operator = Arc::new(OperatorState::new(1, 1.0));
        operator.start(1.0, 1);

        struct CountCallback {
            count: u64,
            operator: Arc<OperatorState>,
            stop_after: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
                self.count = self.count.saturating_add(1);
                if self.count >= self.stop_after {
                    self.operator.stop();
                }
            }
        }
        let mut callback = CountCallback { count: 0, operator: Arc::clone(&operator), stop_after: 3 };

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            run_autorun(&mut state, &configs, &operator, &mut callback),
        )
        .await;

        assert!(result.is_err(), "run_autorun only returns on tick error; timeout confirms it kept idling once stopped");
        assert_eq!(callback.count, 3);
        assert!(!operator.is_running());
    }
}
