//! Error types for event fan-out.

/// Errors from the pub/sub fan-out layer.
#[derive(Debug, thiserror::Error)]
pub enum EventsError {
    /// Failed to connect to or publish on the NATS server.
    #[error("NATS error: {0}")]
    Nats(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
