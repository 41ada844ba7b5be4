//! Durable agent records (spec §4.1: `putAgent`, `getAgent`, `listAgents`).

use npc_types::{Agent, AgentId, FactionId};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::retry::with_backoff;

/// Filter applied by [`AgentStore::list`].
#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub zone: Option<String>,
    pub faction: Option<FactionId>,
}

/// Offset/limit pagination.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    #[must_use]
    pub const fn first(limit: i64) -> Self {
        Self { offset: 0, limit }
    }
}

/// Operations on the `agents` table.
pub struct AgentStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AgentStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert an agent record, retrying transient failures with backoff.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn put(&self, agent: &Agent) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data = serde_json::to_value(agent).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            let zone = agent.location.as_ref().map(|loc| loc.zone.clone());
            sqlx::query(
                r"INSERT INTO agents (id, zone, data, updated_at)
                  VALUES ($1, $2, $3, now())
                  ON CONFLICT (id) DO UPDATE SET zone = $2, data = $3, updated_at = now()",
            )
            .bind(agent.id.into_inner())
            .bind(zone)
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Fetch one agent by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the stored row fails to
    /// deserialize; returns `Ok(None)` if no such agent exists.
    pub async fn get(&self, id: AgentId) -> Result<Option<Agent>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM agents WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;

        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// List agents matching `filter`, paginated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list(&self, filter: &AgentFilter, page: Page) -> Result<Vec<Agent>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = match &filter.zone {
            Some(zone) => {
                sqlx::query_as(
                    r"SELECT data FROM agents WHERE zone = $1 ORDER BY id LIMIT $2 OFFSET $3",
                )
                .bind(zone)
                .bind(page.limit)
                .bind(page.offset)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as(r"SELECT data FROM agents ORDER BY id LIMIT $1 OFFSET $2")
                    .bind(page.limit)
                    .bind(page.offset)
                    .fetch_all(self.pool)
                    .await?
            }
        };

        let agents: Vec<Agent> = rows
            .into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect::<Result<_, _>>()?;

        Ok(match &filter.faction {
            Some(faction) => agents
                .into_iter()
                .filter(|agent| agent.faction == Some(*faction))
                .collect(),
            None => agents,
        })
    }
}
