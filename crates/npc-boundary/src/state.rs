//! Shared application state for the Boundary API server.
//!
//! [`AppState`] bundles everything a request handler needs: the live
//! [`SimulationState`] (clock, agents, factions, quests, world events),
//! the [`GroupOrchestrator`] for conversation lifecycle, the shared
//! [`Oracle`], autorun [`OperatorState`], and the outbound
//! [`EventBus`]/[`NatsFanout`] pair.
//!
//! `SimulationState` itself holds no connection to storage (see
//! `npc-core`'s `tick` module docs); `npc-engine` is responsible for
//! loading it from `npc-store` at startup and persisting it back on a
//! schedule. The Boundary layer here works directly against the
//! in-memory copy, guarded by one coarse [`tokio::sync::Mutex`] rather
//! than the per-agent mailbox actors spec §5 describes: this process is
//! the contract-only HTTP/WS surface, and a single global lock preserves
//! the spec's single-writer-per-agent invariant trivially. The dominant
//! per-request latency is the Oracle call, not lock contention, so this
//! trade is recorded as an open decision in `DESIGN.md` rather than
//! built out as a full actor-per-agent system.

use std::collections::BTreeMap;
use std::sync::Arc;

use npc_agents::config::{MemoryConfig, VitalsConfig};
use npc_core::config::{FactionConfig, GroupConfig, ProximityConfig, TieringConfig, TimeConfig};
use npc_core::group::GroupOrchestrator;
use npc_core::operator::OperatorState;
use npc_core::tick::{SimulationState, TickConfigs};
use npc_events::EventBus;
use npc_events::nats::NatsFanout;
use npc_oracle::Oracle;
use npc_types::{PlayerId, ZonePosition};
use tokio::sync::Mutex;

/// Every tunable knob the Boundary layer needs, bundled so [`AppState`]
/// owns one struct instead of six loose fields.
#[derive(Debug, Clone)]
pub struct BoundaryConfigs {
    pub time: TimeConfig,
    pub tiering: TieringConfig,
    pub proximity: ProximityConfig,
    pub group: GroupConfig,
    pub faction: FactionConfig,
    pub memory: MemoryConfig,
    pub vitals: VitalsConfig,
}

impl Default for BoundaryConfigs {
    fn default() -> Self {
        Self {
            time: TimeConfig::default(),
            tiering: TieringConfig::default(),
            proximity: ProximityConfig::default(),
            group: GroupConfig::default(),
            faction: FactionConfig::default(),
            memory: MemoryConfig::default(),
            vitals: VitalsConfig::default(),
        }
    }
}

impl BoundaryConfigs {
    /// Borrow the subset [`npc_core::tick::run_tick`] needs.
    #[must_use]
    pub fn tick_configs(&self) -> TickConfigs<'_> {
        TickConfigs {
            tiering: &self.tiering,
            faction: &self.faction,
            memory: &self.memory,
            vitals: &self.vitals,
        }
    }
}

/// Shared state for the Axum application.
#[derive(Clone)]
pub struct AppState {
    /// The live simulation: clock, agents, factions, quests, world
    /// events. One coarse lock enforces the single-writer invariant
    /// (see module docs).
    pub simulation: Arc<Mutex<SimulationState>>,
    /// Conversation group lifecycle, locked independently from the main
    /// simulation state since turn-taking spans several awaited Oracle
    /// calls per message.
    pub groups: Arc<Mutex<GroupOrchestrator>>,
    /// The shared Oracle: `cognize`/`synthesize`/`transcribe`.
    pub oracle: Arc<Oracle>,
    /// Autorun control state backing `/world/start`, `/world/stop`.
    pub operator: Arc<OperatorState>,
    /// In-process fan-out for `subscribe_events` WebSocket clients.
    pub events: Arc<EventBus>,
    /// Optional external fan-out, absent when no NATS server is
    /// configured.
    pub nats: Option<Arc<NatsFanout>>,
    /// Tunable configuration for every module the Boundary drives.
    pub configs: Arc<BoundaryConfigs>,
    /// Player locations, tracked separately from
    /// [`npc_core::proximity::ProximityIndex`] since that index only
    /// tracks `AgentId`; `/conversation/location/player/{id}` writes here.
    pub player_positions: Arc<Mutex<BTreeMap<PlayerId, ZonePosition>>>,
}

impl AppState {
    /// Build application state around an already-loaded simulation.
    #[must_use]
    pub fn new(
        simulation: SimulationState,
        oracle: Oracle,
        operator: OperatorState,
        configs: BoundaryConfigs,
    ) -> Self {
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            groups: Arc::new(Mutex::new(GroupOrchestrator::new())),
            oracle: Arc::new(oracle),
            operator: Arc::new(operator),
            events: Arc::new(EventBus::new()),
            nats: None,
            configs: Arc::new(configs),
            player_positions: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Attach an external NATS fan-out.
    #[must_use]
    pub fn with_nats(mut self, nats: NatsFanout) -> Self {
        self.nats = Some(Arc::new(nats));
        self
    }

    /// Publish an outbound message to both the in-process bus and, if
    /// configured, the external NATS fan-out.
    pub fn publish(&self, message: npc_events::OutboundMessage) {
        self.events.publish(message.clone());
        if let Some(nats) = &self.nats {
            nats.publish(&message);
        }
    }
}
