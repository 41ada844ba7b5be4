//! Write-behind coalescing queue for vitals/mood updates (spec §4.1: "a
//! write-behind queue coalesces vitals/mood updates; coalescing window
//! ≤ 2s").
//!
//! Callers submit the latest snapshot for an agent; a background task
//! drains the queue on a fixed interval and flushes the coalesced batch
//! through [`crate::agent_store::AgentStore`]. Only the newest submission
//! per agent in a window survives, so a hot agent producing many updates
//! between flushes still costs one write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use npc_types::{Agent, AgentId};
use tokio::sync::{mpsc, Mutex};

use crate::agent_store::AgentStore;
use crate::error::StoreError;

/// Default coalescing window (spec §4.1).
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(2);

/// Bound on the channel feeding the flush task; back-pressure (not failure)
/// once full, per spec §5's "Store writes suspend on the write-behind queue
/// if full".
const CHANNEL_CAPACITY: usize = 4096;

/// Handle for submitting agent snapshots to the write-behind queue.
#[derive(Clone)]
pub struct WriteBehindQueue {
    sender: mpsc::Sender<Agent>,
}

impl WriteBehindQueue {
    /// Spawn the background flush task and return a handle for submitting
    /// updates. The task runs until every [`WriteBehindQueue`] clone and the
    /// returned receiver task handle are dropped.
    pub fn spawn(pool: Arc<sqlx::PgPool>, flush_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(run_flush_loop(pool, receiver, flush_interval));
        Self { sender }
    }

    #[must_use]
    pub fn with_defaults(pool: Arc<sqlx::PgPool>) -> Self {
        Self::spawn(pool, DEFAULT_FLUSH_INTERVAL)
    }

    /// Submit the latest known state for an agent. Suspends if the channel
    /// is full rather than failing (spec §5).
    pub async fn submit(&self, agent: Agent) {
        if self.sender.send(agent).await.is_err() {
            tracing::error!("write-behind flush task is gone, dropping update");
        }
    }
}

async fn run_flush_loop(
    pool: Arc<sqlx::PgPool>,
    mut receiver: mpsc::Receiver<Agent>,
    flush_interval: Duration,
) {
    let pending: Arc<Mutex<HashMap<AgentId, Agent>>> = Arc::new(Mutex::new(HashMap::new()));
    let mut ticker = tokio::time::interval(flush_interval);

    loop {
        tokio::select! {
            maybe_agent = receiver.recv() => {
                match maybe_agent {
                    Some(agent) => {
                        pending.lock().await.insert(agent.id, agent);
                    }
                    None => {
                        flush(&pool, &pending).await;
                        return;
                    }
                }
            }
            _ = ticker.tick() => {
                flush(&pool, &pending).await;
            }
        }
    }
}

async fn flush(pool: &sqlx::PgPool, pending: &Arc<Mutex<HashMap<AgentId, Agent>>>) {
    let batch: Vec<Agent> = {
        let mut guard = pending.lock().await;
        guard.drain().map(|(_, agent)| agent).collect()
    };
    if batch.is_empty() {
        return;
    }

    let store = AgentStore::new(pool);
    let count = batch.len();
    for agent in batch {
        if let Err(err) = flush_one(&store, &agent).await {
            tracing::warn!(agent_id = %agent.id, %err, "coalesced vitals/mood write failed");
        }
    }
    tracing::debug!(count, "flushed coalesced agent writes");
}

async fn flush_one(store: &AgentStore<'_>, agent: &Agent) -> Result<(), StoreError> {
    store.put(agent).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use npc_types::{Mood, Personality, Vitals};

    fn sample_agent() -> Agent {
        let now = chrono::Utc::now();
        Agent {
            id: AgentId::new(),
            role: "villager".to_owned(),
            location: None,
            personality: Personality {
                curiosity: 0.5,
                cooperation: 0.5,
                aggression: 0.5,
                risk_tolerance: 0.5,
                industriousness: 0.5,
                sociability: 0.5,
                honesty: 0.5,
                loyalty: 0.5,
                paranoia: 0.5,
            },
            vitals: Vitals::fresh(),
            mood: Mood::neutral(),
            faction: None,
            goals: Vec::new(),
            voice_fingerprint: None,
            created_at: now,
            last_active_at: now,
        }
    }

    #[tokio::test]
    async fn submitting_twice_for_the_same_agent_coalesces_to_one_entry() {
        let pending: Arc<Mutex<HashMap<AgentId, Agent>>> = Arc::new(Mutex::new(HashMap::new()));
        let mut agent = sample_agent();
        pending.lock().await.insert(agent.id, agent.clone());
        agent.vitals.hunger = 0.9;
        pending.lock().await.insert(agent.id, agent.clone());

        let guard = pending.lock().await;
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.get(&agent.id).map(|a| a.vitals.hunger), Some(0.9));
    }
}
