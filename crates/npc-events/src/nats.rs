//! Optional external fan-out of outbound events over NATS, for consumers
//! outside the Boundary WebSocket (e.g. an analytics sidecar).
//!
//! Grounded on the agent runner's NATS client: connect once, publish
//! fire-and-forget, log failures rather than propagate them, since a
//! missing or unreachable NATS server must never stall the tick pipeline
//! or a client's WebSocket frame.

use tracing::warn;

use crate::error::EventsError;
use crate::message::OutboundMessage;

/// Subject prefix every outbound event is published under. The full
/// subject is `npc.events.<type>`, e.g. `npc.events.world_event`.
const SUBJECT_PREFIX: &str = "npc.events";

/// A connected NATS publisher for outbound event fan-out.
pub struct NatsFanout {
    client: async_nats::Client,
}

impl NatsFanout {
    /// Connect to a NATS server at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`EventsError::Nats`] if the connection cannot be
    /// established.
    pub async fn connect(url: &str) -> Result<Self, EventsError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| EventsError::Nats(format!("failed to connect to {url}: {e}")))?;
        Ok(Self { client })
    }

    /// Publish a message fire-and-forget.
    ///
    /// Serialization or publish failures are logged and dropped; external
    /// fan-out is best-effort and must never block or fail a tick or a
    /// client request.
    pub fn publish(&self, message: &OutboundMessage) {
        let subject = format!("{SUBJECT_PREFIX}.{}", message.kind());
        match serde_json::to_vec(message) {
            Ok(payload) => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                        warn!(subject = subject, error = %e, "failed to publish to NATS");
                    }
                });
            }
            Err(e) => {
                warn!(subject = subject, error = %e, "failed to serialize outbound message");
            }
        }
    }
}

impl std::fmt::Debug for NatsFanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsFanout").field("connected", &true).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn connect_to_nats() {
        let result = NatsFanout::connect("nats://localhost:4222").await;
        assert!(result.is_ok());
    }
}
