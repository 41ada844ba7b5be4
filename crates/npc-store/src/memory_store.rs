//! Durable memory records (spec §4.1: `insertMemory`, `queryMemories`,
//! `bulkUpdateStrength`, `deleteBelow`).
//!
//! Decay and cleanup are issued as bulk operations — one call per sweep,
//! never one per memory (spec §4.1, §9 "Per-memory decay loop").

use npc_types::{AgentId, Memory, MemoryId, SubjectId};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::retry::with_backoff;

/// Operations on the `memories` table.
pub struct MemoryStore<'a> {
    pool: &'a PgPool,
}

fn subject_parts(subject: SubjectId) -> (&'static str, uuid::Uuid) {
    match subject {
        SubjectId::Player(id) => ("player", id.into_inner()),
        SubjectId::Agent(id) => ("agent", id.into_inner()),
    }
}

impl<'a> MemoryStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new memory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn insert(&self, memory: &Memory) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data =
                serde_json::to_value(memory).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            let (kind, subject_id) = subject_parts(memory.subject);
            sqlx::query(
                r"INSERT INTO memories (id, owner_agent, subject_kind, subject_id, strength, last_referenced_at, data)
                  VALUES ($1, $2, $3, $4, $5, $6, $7)
                  ON CONFLICT (id) DO UPDATE SET strength = $5, last_referenced_at = $6, data = $7",
            )
            .bind(memory.id.into_inner())
            .bind(memory.owner_agent.into_inner())
            .bind(kind)
            .bind(subject_id)
            .bind(memory.strength)
            .bind(memory.last_referenced_at)
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Query memories for `owner`, optionally narrowed to one subject and a
    /// minimum strength, capped to `limit` rows ordered by retrieval score.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn query(
        &self,
        owner: AgentId,
        subject: Option<SubjectId>,
        min_strength: Option<f64>,
        limit: i64,
    ) -> Result<Vec<Memory>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = if let Some(subject) = subject {
            let (kind, subject_id) = subject_parts(subject);
            sqlx::query_as(
                r"SELECT data FROM memories
                  WHERE owner_agent = $1 AND subject_kind = $2 AND subject_id = $3
                    AND strength >= $4
                  ORDER BY strength DESC LIMIT $5",
            )
            .bind(owner.into_inner())
            .bind(kind)
            .bind(subject_id)
            .bind(min_strength.unwrap_or(0.0))
            .bind(limit)
            .fetch_all(self.pool)
            .await?
        } else {
            sqlx::query_as(
                r"SELECT data FROM memories
                  WHERE owner_agent = $1 AND strength >= $2
                  ORDER BY strength DESC LIMIT $3",
            )
            .bind(owner.into_inner())
            .bind(min_strength.unwrap_or(0.0))
            .bind(limit)
            .fetch_all(self.pool)
            .await?
        };

        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }

    /// Apply a decay sweep's new strengths in a single bulk statement.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn bulk_update_strength(
        &self,
        updates: &[(MemoryId, f64)],
    ) -> Result<(), StoreError> {
        if updates.is_empty() {
            return Ok(());
        }

        let ids: Vec<uuid::Uuid> = updates.iter().map(|(id, _)| id.into_inner()).collect();
        let strengths: Vec<f64> = updates.iter().map(|(_, s)| *s).collect();

        with_backoff(|| async {
            sqlx::query(
                r"UPDATE memories AS m SET strength = u.strength
                  FROM UNNEST($1::uuid[], $2::double precision[]) AS u(id, strength)
                  WHERE m.id = u.id",
            )
            .bind(&ids)
            .bind(&strengths)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await?;

        tracing::debug!(count = updates.len(), "bulk-updated memory strengths");
        Ok(())
    }

    /// Delete every memory with `strength` below `threshold` (cleanup sweep).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the delete fails.
    pub async fn delete_below(&self, threshold: f64) -> Result<u64, StoreError> {
        let result = sqlx::query(r"DELETE FROM memories WHERE strength < $1")
            .bind(threshold)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
