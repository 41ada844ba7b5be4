//! Error types for the NPC simulation binary.
//!
//! [`EngineError`] is the top-level error type that wraps every failure
//! mode `main` can encounter during startup and the autorun loop.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, so `main` can propagate
/// with `?` down to a single exit path.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: config::ConfigError,
    },

    /// World clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: npc_core::clock::ClockError,
    },

    /// The proximity index rejected its configuration.
    #[error("proximity error: {source}")]
    Proximity {
        /// The underlying proximity error.
        #[from]
        source: npc_core::proximity::ProximityError,
    },

    /// Connecting to or migrating the durable store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: npc_store::StoreError,
    },

    /// The Oracle failed to initialize, typically a missing or malformed
    /// prompt template directory.
    #[error("oracle error: {source}")]
    Oracle {
        /// The underlying Oracle error.
        #[from]
        source: npc_oracle::OracleError,
    },

    /// The autorun tick loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: npc_core::runner::RunnerError,
    },

    /// The Boundary HTTP server failed to spawn.
    #[error("boundary startup error: {source}")]
    Boundary {
        /// The underlying startup error.
        #[from]
        source: npc_boundary::StartupError,
    },

    /// Connecting to NATS for external event fan-out failed.
    #[error("events error: {source}")]
    Events {
        /// The underlying events error.
        #[from]
        source: npc_events::error::EventsError,
    },
}
