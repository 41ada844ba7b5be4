//! Durable faction, territory, trade route, and battle records (spec §4.1:
//! `getFaction`, `getTerritory`, `putRoute`) plus the reads the Boundary
//! contract needs for `/factions`, `/territory/control`, `/traderoutes`.

use npc_types::{Battle, BattleId, Faction, FactionId, Territory, TerritoryId, TradeRoute};
use sqlx::PgPool;

use crate::error::StoreError;
use crate::retry::with_backoff;

/// Operations on `factions`, `territories`, `trade_routes`, and `battles`.
pub struct FactionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> FactionStore<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn put_faction(&self, faction: &Faction) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data =
                serde_json::to_value(faction).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            sqlx::query(
                r"INSERT INTO factions (id, data) VALUES ($1, $2)
                  ON CONFLICT (id) DO UPDATE SET data = $2",
            )
            .bind(faction.id.into_inner())
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_faction(&self, id: FactionId) -> Result<Option<Faction>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM factions WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list_factions(&self) -> Result<Vec<Faction>, StoreError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM factions ORDER BY id").fetch_all(self.pool).await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn put_territory(&self, territory: &Territory) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data =
                serde_json::to_value(territory).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            sqlx::query(
                r"INSERT INTO territories (id, controlling_faction, data) VALUES ($1, $2, $3)
                  ON CONFLICT (id) DO UPDATE SET controlling_faction = $2, data = $3",
            )
            .bind(territory.id.into_inner())
            .bind(territory.controlling_faction.into_inner())
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_territory(&self, id: TerritoryId) -> Result<Option<Territory>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM territories WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// All territories, for the `/territory/control` read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list_territories(&self) -> Result<Vec<Territory>, StoreError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM territories ORDER BY id").fetch_all(self.pool).await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn put_route(&self, route: &TradeRoute) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data =
                serde_json::to_value(route).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            let status = format!("{:?}", route.status);
            sqlx::query(
                r"INSERT INTO trade_routes (id, status, data) VALUES ($1, $2, $3)
                  ON CONFLICT (id) DO UPDATE SET status = $2, data = $3",
            )
            .bind(route.id.into_inner())
            .bind(status)
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list_routes(&self) -> Result<Vec<TradeRoute>, StoreError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM trade_routes ORDER BY id").fetch_all(self.pool).await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] after retries are exhausted.
    pub async fn put_battle(&self, battle: &Battle) -> Result<(), StoreError> {
        with_backoff(|| async {
            let data =
                serde_json::to_value(battle).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
            let status = format!("{:?}", battle.status);
            sqlx::query(
                r"INSERT INTO battles (id, status, data) VALUES ($1, $2, $3)
                  ON CONFLICT (id) DO UPDATE SET status = $2, data = $3",
            )
            .bind(battle.id.into_inner())
            .bind(status)
            .bind(&data)
            .execute(self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the row fails to decode.
    pub async fn get_battle(&self, id: BattleId) -> Result<Option<Battle>, StoreError> {
        let row: Option<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM battles WHERE id = $1")
                .bind(id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        row.map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .transpose()
    }

    /// Battles currently `inProgress`, scanned once per tick by FactionEngine.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] or [`StoreError::Serialization`].
    pub async fn list_in_progress_battles(&self) -> Result<Vec<Battle>, StoreError> {
        let rows: Vec<(serde_json::Value,)> =
            sqlx::query_as(r"SELECT data FROM battles WHERE status = 'InProgress' ORDER BY id")
                .fetch_all(self.pool)
                .await?;
        rows.into_iter()
            .map(|(data,)| serde_json::from_value(data).map_err(StoreError::Serialization))
            .collect()
    }
}
