//! World clock, tiering, proximity, group orchestration, factions, and the
//! Brain cognition pipeline for a long-lived NPC simulation.
//!
//! This crate owns the per-tick pipeline (spec §4.7): advance time, decay
//! memory, advance factions, process tiered agents, sweep quests, and log
//! world events. It also owns the synchronous, per-interaction Brain
//! cognition path that the Boundary layer calls directly, outside any
//! tick.
//!
//! # Modules
//!
//! - [`clock`] -- [`clock::WorldClock`], owner of simulated time and the
//!   process-wide tick RNG.
//! - [`config`] -- strongly-typed configuration for every module below,
//!   loaded by `npc-engine`'s layered configuration.
//! - [`proximity`] -- [`proximity::ProximityIndex`], spatial "who is
//!   nearby" queries.
//! - [`tiering`] -- per-agent activity classification and tick-skipping.
//! - [`group`] -- [`group::GroupOrchestrator`], multi-agent conversation
//!   lifecycle and turn-taking.
//! - [`faction`] -- [`faction::FactionEngine`], inter-faction relations,
//!   battles, and trade routes.
//! - [`brain`] -- [`brain::Brain`], the double-pass cognition pipeline.
//! - [`tick`] -- [`tick::run_tick`], the per-tick pipeline tying the above
//!   together.
//! - [`operator`] -- shared control state for pause/resume/stop and
//!   autorun speed.
//! - [`runner`] -- the autorun loop driving [`tick::run_tick`] on a
//!   wall-clock interval.

pub mod brain;
pub mod clock;
pub mod config;
pub mod faction;
pub mod group;
pub mod operator;
pub mod proximity;
pub mod runner;
pub mod tick;
pub mod tiering;
