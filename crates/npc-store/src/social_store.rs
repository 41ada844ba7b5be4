//! Durable relation, reputation, quest, and conversation-group records.
//!
//! These are not named individually in spec §4.1's Store contract (which
//! focuses on agents/memories/factions/events) but are required by the
//! Boundary reads and writes in spec §6 (`/quest/*`, `/conversation/*`) and
//! by the data model's ownership rules in spec §3.

use npc_types::{
    AgentId, AgentReputation, ConversationGroup, FactionId, FactionReputation, GroupId, PlayerId,
    Quest, QuestId, Relation,
};
use sqlx::PgPool;

use crate::error::StoreError;

/// Operations on `relations`, `agent_reputations`, `faction_reputations`,
/// `quests`, and `conversation_groups`.
pub struct SocialStore<'a> {
    pool: &'a PgPool,
}

impl<'a> SocialStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn put_relation(&self, relation: &Relation) -> Result<(), StoreError> {
        let data = serde_json::to_value(relation)?;
        sqlx::query(
            r"INSERT INTO relations (agent_a, agent_b, data) VALUES ($1, $2, $3)
              ON CONFLICT (agent_a, agent_b) DO UPDATE SET data = $3",
        )
        .bind(relation.agent_a.into_inner())
        .bind(relation.agent_b.into_inner())
        .bind(&data)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Directed lookup: `agent_a`'s view of `agent_b`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_relation(
        &self,
        agent_a: AgentId,
        agent_b: AgentId,
    ) -> Result<Option<Relation>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM relations WHERE agent_a = $1 AND agent_b = $2")
                .bind(agent_a.into_inner())
                .bind(agent_b.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn put_agent_reputation(&self, rep: &AgentReputation) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO agent_reputations (player_id, agent_id, value) VALUES ($1, $2, $3)
              ON CONFLICT (player_id, agent_id) DO UPDATE SET value = $3",
        )
        .bind(rep.player_id.into_inner())
        .bind(rep.agent_id.into_inner())
        .bind(rep.value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn get_agent_reputation(
        &self,
        player_id: PlayerId,
        agent_id: AgentId,
    ) -> Result<f64, StoreError> {
        let row: Option<(f64,)> = sqlx::query_as(
            r"SELECT value FROM agent_reputations WHERE player_id = $1 AND agent_id = $2",
        )
        .bind(player_id.into_inner())
        .bind(agent_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map_or(0.0, |(value,)| value))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn put_faction_reputation(&self, rep: &FactionReputation) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO faction_reputations (player_id, faction_id, value) VALUES ($1, $2, $3)
              ON CONFLICT (player_id, faction_id) DO UPDATE SET value = $3",
        )
        .bind(rep.player_id.into_inner())
        .bind(rep.faction_id.into_inner())
        .bind(rep.value)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn get_faction_reputation(
        &self,
        player_id: PlayerId,
        faction_id: FactionId,
    ) -> Result<f64, StoreError> {
        let row: Option<(f64,)> = sqlx::query_as(
            r"SELECT value FROM faction_reputations WHERE player_id = $1 AND faction_id = $2",
        )
        .bind(player_id.into_inner())
        .bind(faction_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map_or(0.0, |(value,)| value))
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn put_quest(&self, quest: &Quest) -> Result<(), StoreError> {
        let data = serde_json::to_value(quest)?;
        let status = format!("{:?}", quest.status);
        sqlx::query(
            r"INSERT INTO quests (id, status, data) VALUES ($1, $2, $3)
              ON CONFLICT (id) DO UPDATE SET status = $2, data = $3",
        )
        .bind(quest.id.into_inner())
        .bind(status)
        .bind(&data)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_quest(&self, id: QuestId) -> Result<Option<Quest>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM quests WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// Quests still `available` or `accepted`, scanned by the expiry sweep.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list_open_quests(&self) -> Result<Vec<Quest>, StoreError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            r"SELECT data FROM quests WHERE status IN ('Available', 'Accepted') ORDER BY id",
        )
        .fetch_all(self.pool)
        .await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the upsert fails.
    pub async fn put_group(&self, group: &ConversationGroup) -> Result<(), StoreError> {
        let data = serde_json::to_value(group)?;
        sqlx::query(
            r"INSERT INTO conversation_groups (id, data) VALUES ($1, $2)
              ON CONFLICT (id) DO UPDATE SET data = $2",
        )
        .bind(group.id.into_inner())
        .bind(&data)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_group(&self, id: GroupId) -> Result<Option<ConversationGroup>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM conversation_groups WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the delete fails.
    pub async fn delete_group(&self, id: GroupId) -> Result<(), StoreError> {
        sqlx::query(r"DELETE FROM conversation_groups WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
