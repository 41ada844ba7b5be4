//! Memory decay, reinforcement, retrieval ordering, and gossip sharing
//! (spec §4.4).
//!
//! This module is pure computation over [`Memory`] values; it has no
//! knowledge of how memories are persisted or queried in bulk -- that is
//! `npc-store`'s job. `npc-core`'s tick pipeline and Brain call into these
//! functions and hand the results to the store as bulk operations.

use chrono::{DateTime, Utc};
use npc_types::{AgentId, Memory, MemoryCategory};

use crate::config::MemoryConfig;

/// Elapsed hours between two timestamps, never negative.
#[must_use]
pub fn elapsed_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds().max(0) as f64 / 3_600_000.0
}

/// Apply the exponential decay rule to one memory's strength over
/// `elapsed_hours`: `s <- s * exp(-lambda * dh * (1 - w))` (spec §3). Higher
/// `emotional_weight` slows decay.
#[must_use]
pub fn decay_strength(memory: &Memory, elapsed_hours: f64, config: &MemoryConfig) -> f64 {
    let rate = config.lambda * elapsed_hours * (1.0 - memory.emotional_weight);
    memory.strength * (-rate).exp()
}

/// Decay every memory in `memories` in place by `elapsed_hours`, returning
/// the `(id, new_strength)` pairs the caller should bulk-persist (spec
/// §4.4: "one sweep per world tick; batched through Store").
pub fn decay_sweep(
    memories: &mut [Memory],
    elapsed_hours: f64,
    config: &MemoryConfig,
) -> Vec<(npc_types::MemoryId, f64)> {
    memories
        .iter_mut()
        .map(|memory| {
            let new_strength = decay_strength(memory, elapsed_hours, config);
            memory.strength = new_strength;
            (memory.id, new_strength)
        })
        .collect()
}

/// Reinforce a memory on retrieval: `s <- min(1, s + alpha * (1 - s))`,
/// bump `ref_count`, and update `last_referenced_at` (spec §4.4).
pub fn reinforce(memory: &mut Memory, config: &MemoryConfig, at: DateTime<Utc>) {
    memory.strength = (memory.strength + config.reinforcement_alpha * (1.0 - memory.strength)).min(1.0);
    memory.ref_count = memory.ref_count.saturating_add(1);
    memory.last_referenced_at = at;
}

/// Whether a memory has decayed past the forgotten threshold and must be
/// hidden from retrieval (spec §3: "forgotten memories MUST NOT appear in
/// retrieval").
#[must_use]
pub fn is_forgotten(memory: &Memory) -> bool {
    memory.strength < Memory::FORGOTTEN_THRESHOLD
}

/// Whether a memory has decayed past the deletion threshold and is
/// eligible for the next cleanup sweep.
#[must_use]
pub fn is_eligible_for_deletion(memory: &Memory) -> bool {
    memory.strength < Memory::DELETION_THRESHOLD
}

/// Order candidate memories for prompt assembly: by
/// `strength * (1 + 0.5 * emotionalWeight)` descending, capped to
/// `config.retrieval_limit` (spec §4.4), excluding forgotten memories.
#[must_use]
pub fn retrieve<'a>(candidates: &'a [Memory], config: &MemoryConfig) -> Vec<&'a Memory> {
    let mut scored: Vec<&Memory> = candidates.iter().filter(|m| !is_forgotten(m)).collect();
    scored.sort_by(|a, b| {
        b.retrieval_score()
            .partial_cmp(&a.retrieval_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(config.retrieval_limit);
    scored
}

/// Build the secondhand memories `to` receives from `from`'s strongest
/// shareable memories about `subject` (spec §4.4 "Share (gossip)").
///
/// Picks the top `config.gossip_top_m` shareable (non-forgotten, firsthand
/// or already-secondhand) memories `from` holds about `subject`, scaling
/// each by `trust(to -> from) * gossip_decay_factor`. The result is never
/// inserted directly -- callers own the `owner_agent`/`id`/`created_at`
/// assignment so the store sees fresh, distinct records.
#[must_use]
pub fn share(
    from_memories: &[Memory],
    subject: npc_types::SubjectId,
    trust_to_from: f64,
    config: &MemoryConfig,
) -> Vec<SharedMemoryDraft> {
    let mut candidates: Vec<&Memory> =
        from_memories.iter().filter(|m| m.subject == subject && !is_forgotten(m)).collect();
    candidates.sort_by(|a, b| {
        b.retrieval_score()
            .partial_cmp(&a.retrieval_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(config.gossip_top_m);

    let scale = trust_to_from.clamp(0.0, 1.0) * config.gossip_decay_factor;
    candidates
        .into_iter()
        .map(|memory| SharedMemoryDraft {
            subject: memory.subject,
            category: memory.category,
            content: memory.content.clone(),
            strength: memory.strength * scale,
            emotional_weight: memory.emotional_weight,
        })
        .collect()
}

/// The fields a caller needs to construct a secondhand [`Memory`] after
/// [`share`] has computed its strength. Never upgrades to firsthand: the
/// caller is responsible for setting `source = Some(from_agent)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedMemoryDraft {
    pub subject: npc_types::SubjectId,
    pub category: MemoryCategory,
    pub content: String,
    pub strength: f64,
    pub emotional_weight: f64,
}

impl SharedMemoryDraft {
    /// Materialize into a full secondhand [`Memory`] owned by `owner`.
    #[must_use]
    pub fn into_memory(self, owner: AgentId, from_agent: AgentId, at: DateTime<Utc>) -> Memory {
        Memory {
            id: npc_types::MemoryId::new(),
            owner_agent: owner,
            subject: self.subject,
            category: self.category,
            content: self.content,
            strength: self.strength,
            emotional_weight: self.emotional_weight,
            created_at: at,
            last_referenced_at: at,
            ref_count: 0,
            source: Some(from_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npc_types::{MemoryId, SubjectId};

    fn sample_memory(strength: f64, emotional_weight: f64) -> Memory {
        let now = Utc::now();
        Memory {
            id: MemoryId::new(),
            owner_agent: AgentId::new(),
            subject: SubjectId::Player(npc_types::PlayerId::new()),
            category: MemoryCategory::Event,
            content: "shared a meal".to_owned(),
            strength,
            emotional_weight,
            created_at: now,
            last_referenced_at: now,
            ref_count: 0,
            source: None,
        }
    }

    #[test]
    fn decay_is_monotonically_non_increasing() {
        let memory = sample_memory(0.8, 0.2);
        let config = MemoryConfig::default();
        let decayed = decay_strength(&memory, 5.0, &config);
        assert!(decayed <= memory.strength);
    }

    #[test]
    fn higher_emotional_weight_slows_decay() {
        let config = MemoryConfig::default();
        let calm = sample_memory(0.8, 0.0);
        let vivid = sample_memory(0.8, 0.9);
        assert!(decay_strength(&vivid, 10.0, &config) > decay_strength(&calm, 10.0, &config));
    }

    #[test]
    fn reinforce_never_exceeds_one() {
        let mut memory = sample_memory(0.95, 0.5);
        let config = MemoryConfig::default();
        for _ in 0..50 {
            reinforce(&mut memory, &config, Utc::now());
        }
        assert!(memory.strength <= 1.0);
    }

    #[test]
    fn retrieval_excludes_forgotten_memories() {
        let config = MemoryConfig::default();
        let strong = sample_memory(0.6, 0.3);
        let forgotten = sample_memory(0.01, 0.3);
        let candidates = vec![strong.clone(), forgotten];
        let retrieved = retrieve(&candidates, &config);
        assert_eq!(retrieved.len(), 1);
        assert_eq!(retrieved[0].id, strong.id);
    }

    #[test]
    fn share_caps_to_top_m_and_scales_by_trust() {
        let config = MemoryConfig::default();
        let subject = SubjectId::Player(npc_types::PlayerId::new());
        let memories: Vec<Memory> = (0..5)
            .map(|i| {
                let mut memory = sample_memory(0.9, 0.1);
                memory.subject = subject;
                memory.strength = 0.5 + f64::from(i) * 0.05;
                memory
            })
            .collect();

        let shared = share(&memories, subject, 0.5, &config);
        assert_eq!(shared.len(), config.gossip_top_m);
        for draft in &shared {
            assert!(draft.strength <= 0.9 * 0.5 * config.gossip_decay_factor + 1e-9);
        }
    }

    #[test]
    fn shared_memory_never_exceeds_source_strength() {
        let config = MemoryConfig::default();
        let subject = SubjectId::Player(npc_types::PlayerId::new());
        let mut source = sample_memory(0.7, 0.2);
        source.subject = subject;
        let shared = share(&[source.clone()], subject, 1.0, &config);
        assert!(shared[0].strength <= source.strength);
    }
}
