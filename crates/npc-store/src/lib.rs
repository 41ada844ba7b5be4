//! Durable storage and hot-read cache for the NPC simulation engine.
//!
//! `PostgreSQL` is the single durable store (spec §4.1), holding agents,
//! memories, rumors, relations, reputations, factions, territories, trade
//! routes, battles, quests, conversation groups, and the world-event log as
//! JSONB documents alongside the indexed scalar columns each read path
//! needs. An in-process bounded LRU cache fronts hot reads (spec §4.2), and
//! a write-behind queue coalesces per-agent vitals/mood updates before they
//! reach Postgres (spec §4.1).
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool, configuration, and migrations
//! - [`retry`] -- exponential backoff for transient write failures
//! - [`agent_store`] -- agent records
//! - [`memory_store`] -- memory records, bulk decay, and cleanup
//! - [`faction_store`] -- factions, territories, trade routes, battles
//! - [`social_store`] -- relations, reputations, quests, conversation groups
//! - [`event_store`] -- the bounded world-event ring
//! - [`cache`] -- bounded LRU with TTL fronting reads
//! - [`write_behind`] -- coalescing queue for vitals/mood writes
//! - [`error`] -- shared error types

pub mod agent_store;
pub mod cache;
pub mod error;
pub mod event_store;
pub mod faction_store;
pub mod memory_store;
pub mod postgres;
pub mod retry;
pub mod social_store;
pub mod write_behind;

pub use agent_store::{AgentFilter, AgentStore, Page};
pub use cache::Cache;
pub use error::StoreError;
pub use event_store::{EventStore, RING_CAPACITY};
pub use faction_store::FactionStore;
pub use memory_store::MemoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use retry::with_backoff;
pub use social_store::SocialStore;
pub use write_behind::WriteBehindQueue;
