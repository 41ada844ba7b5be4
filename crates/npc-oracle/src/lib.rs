//! The Oracle: the sole boundary between the simulation and LLM/TTS/STT
//! providers (spec §4.5).
//!
//! `npc-core`'s Brain assembles per-interaction context and calls
//! [`Oracle::cognize`]; the Oracle owns prompt rendering, provider
//! selection and fallback, response parsing, and validation. No other
//! crate performs provider I/O.
//!
//! # Modules
//!
//! - [`oracle`] -- `Oracle`: `cognize`/`synthesize`/`transcribe`.
//! - [`llm`] -- enum-dispatch LLM backends (`OpenAI`-compatible, Anthropic).
//! - [`prompt`] -- template loading and rendering.
//! - [`parse`] -- response parsing and validation into `CognitiveFrame`.
//! - [`config`] -- provider credentials and per-operation timeouts.
//! - [`error`] -- error types for this crate.

pub mod config;
pub mod error;
pub mod llm;
pub mod oracle;
pub mod parse;
pub mod prompt;

pub use config::OracleConfig;
pub use error::OracleError;
pub use oracle::{CognizeRequest, Oracle, SYNTHESIZE_CHUNK_BYTES};
pub use parse::parse_cognitive_frame;
pub use prompt::{PromptEngine, RenderedPrompt};
