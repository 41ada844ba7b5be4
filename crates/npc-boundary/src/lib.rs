//! Boundary API server for the NPC simulation process (spec §6).
//!
//! This crate provides an Axum HTTP + `WebSocket` server that exposes:
//!
//! - Agent lifecycle and interactive cognition (`/npc/*`, `/memory/decay`)
//! - World/autorun control and the bounded event log (`/world/*`)
//! - Quest generation and state transitions (`/quest/*`)
//! - Faction, territory, battle, and trade-route reads and operations
//!   (`/factions`, `/territory/*`, `/battle/*`, `/traderoute*`)
//! - Group conversation lifecycle and turn-taking (`/conversation/*`)
//! - Oracle voice synthesis and transcription (`/voice/*`, `/speech/*`)
//! - A bidirectional `WebSocket` surface (`/ws/game`) mirroring the same
//!   operations for latency-sensitive clients
//!
//! # Architecture
//!
//! [`state::AppState`] holds the live in-memory `SimulationState` behind
//! one coarse lock; this process never talks to `npc-store` itself.
//! `npc-engine` is responsible for loading state at startup, persisting it
//! back on a schedule, and driving the autorun tick loop -- see
//! `state`'s module docs for why Boundary trades the spec's per-agent
//! actor model for a single lock at this layer.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::BoundaryError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_boundary};
pub use state::{AppState, BoundaryConfigs};
