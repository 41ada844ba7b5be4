//! Per-agent cognitive state, the memory engine, and the social graph for
//! the NPC simulation.
//!
//! This crate is the logic layer for agents: everything that mutates an
//! agent's personality, vitals, mood, goals, memories, and relations
//! without touching I/O. It sits between `npc-types` (data structures) and
//! `npc-core` (tick orchestration, which owns the actual Oracle calls and
//! wiring into `npc-store`).
//!
//! # Modules
//!
//! - [`agent_state`] -- `AgentState`: trait deltas via soft-clamp sigmoid,
//!   vital decay, mood shifts from a cognitive frame, goal lifecycle.
//! - [`memory`] -- `MemoryEngine` operations: decay, reinforcement,
//!   retrieval ordering, gossip sharing.
//! - [`relation`] -- directed trust / symmetric familiarity between agents.
//! - [`reputation`] -- player standing with agents and factions, including
//!   faction-ripple propagation.
//! - [`config`] -- tunable constants for vitals and memory dynamics.
//! - [`error`] -- error types for this crate.

pub mod agent_state;
pub mod config;
pub mod error;
pub mod memory;
pub mod relation;
pub mod reputation;

pub use agent_state::{soft_clamp_sigmoid, AgentState};
pub use config::{MemoryConfig, VitalsConfig};
pub use error::AgentError;
pub use memory::SharedMemoryDraft;
pub use relation::{new_relation, pair_key, record_interaction};
pub use reputation::{is_enemy, ripple_to_enemies, ENEMY_RIPPLE_ETA, FACTION_RIPPLE_FACTOR};
