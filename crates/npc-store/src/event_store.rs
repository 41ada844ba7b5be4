//! The bounded world-event log (spec §4.7: "append summarized events to the
//! world-event log, bounded ring, latest 1000").
//!
//! Writes are batched — one transaction per chunk of the sweep's events,
//! never one round-trip per event.

use npc_types::{EventId, WorldEvent};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::retry::with_backoff;

/// Ring buffer size enforced by [`EventStore::prune`] (spec §4.7).
pub const RING_CAPACITY: i64 = 1000;

/// Default batch size for event inserts.
const DEFAULT_BATCH_SIZE: usize = 100;

/// Operations on the `world_events` table.
pub struct EventStore<'a> {
    pool: &'a PgPool,
    batch_size: usize,
}

impl<'a> EventStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub const fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Batch-append events, in chunks, to the world-event log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] once a chunk's retries are
    /// exhausted.
    pub async fn append(&self, events: &[WorldEvent]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }

        for chunk in events.chunks(self.batch_size) {
            with_backoff(|| async {
                let mut tx = self.pool.begin().await?;
                for event in chunk {
                    let data = serde_json::to_value(event)
                        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                    let total_hours = i64::try_from(event.world_time.total_hours).unwrap_or(i64::MAX);
                    sqlx::query(
                        r"INSERT INTO world_events (event_id, total_hours, kind, data, created_at)
                          VALUES ($1, $2, $3, $4, $5)",
                    )
                    .bind(event.id.into_inner())
                    .bind(total_hours)
                    .bind(&event.kind)
                    .bind(&data)
                    .bind(event.created_at)
                    .execute(&mut *tx)
                    .await?;
                }
                tx.commit().await?;
                Ok(())
            })
            .await?;
        }

        tracing::debug!(count = events.len(), "appended world events");
        Ok(())
    }

    /// Trim the log back to [`RING_CAPACITY`] entries, dropping the oldest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the delete fails.
    pub async fn prune(&self) -> Result<(), StoreError> {
        sqlx::query(
            r"DELETE FROM world_events WHERE id NOT IN (
                 SELECT id FROM world_events ORDER BY id DESC LIMIT $1
               )",
        )
        .bind(RING_CAPACITY)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Read the most recent `limit` events, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`] if
    /// a row fails to deserialize.
    pub async fn list(&self, limit: i64) -> Result<Vec<WorldEvent>, StoreError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM world_events ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(self.pool)
                .await?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }
}

/// Generate a fresh [`EventId`] for a new world event. Thin wrapper kept for
/// symmetry with the rest of the store modules' constructors.
#[must_use]
pub fn new_event_id() -> EventId {
    EventId::new()
}
