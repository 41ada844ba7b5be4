//! World-event log plumbing and pub/sub fan-out for the Boundary layer.
//!
//! `npc-core`'s tick pipeline owns the bounded world-event ring itself;
//! this crate defines how that ring is read (spec §4.7, §6 `GET
//! /world/events?limit=N`) and how new events, faction updates, and quest
//! updates are pushed to connected clients: an in-process broadcast
//! channel ([`bus::EventBus`]) for the WebSocket's `subscribe_events`
//! support, and an optional external NATS fan-out ([`nats::NatsFanout`])
//! for consumers outside the process.
//!
//! # Modules
//!
//! - [`message`] -- [`message::OutboundMessage`], the tagged payload shape
//!   pushed to subscribers.
//! - [`bus`] -- [`bus::EventBus`], the in-process broadcast fan-out.
//! - [`log`] -- [`log::ring_read`], the bounded-ring read contract.
//! - [`nats`] -- [`nats::NatsFanout`], best-effort external fan-out.
//! - [`error`] -- [`error::EventsError`].

pub mod bus;
pub mod error;
pub mod log;
pub mod message;
pub mod nats;

pub use bus::EventBus;
pub use error::EventsError;
pub use message::OutboundMessage;
