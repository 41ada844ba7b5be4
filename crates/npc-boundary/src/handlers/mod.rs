//! Request handlers, grouped by the domain sections of spec §6's HTTP
//! surface.

pub mod conversation;
pub mod faction;
pub mod npc;
pub mod quest;
pub mod voice;
pub mod world;
