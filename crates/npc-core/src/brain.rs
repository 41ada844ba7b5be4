//! The Brain: per-interaction cognition and effects (spec §4.6).
//!
//! Brain owns the double-pass cycle spec §4.6 describes: assemble context
//! from everything the calling agent currently knows, call
//! [`npc_oracle::Oracle::cognize`], then apply every effect -- mood shift,
//! memory reinforcement and insertion, reputation update and its faction
//! ripple, and an urgent world event -- before returning. All of that
//! happens inside one call, so by the time [`BrainOutcome`] comes back
//! every effect has already committed to `state` and is ready for the
//! caller to persist.
//!
//! Brain never talks to a provider itself; all of that lives behind
//! [`npc_oracle::Oracle`]. A timed-out or malformed cognition degrades to
//! [`npc_types::CognitiveFrame::fallback`], which still flows through the
//! same effects path with zero-valued deltas, so an unhealthy Oracle call
//! never stops an interaction from completing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use npc_agents::agent_state::AgentState;
use npc_agents::config::MemoryConfig;
use npc_agents::memory;
use npc_agents::reputation::{self, FACTION_RIPPLE_FACTOR};
use npc_oracle::{CognizeRequest, Oracle};
use npc_types::{
    Agent, EventId, Faction, FactionId, Memory, MemoryId, PlayerId, Rumor, SubjectId, WorldEvent,
    WorldTime,
};
use serde_json::json;

/// How many rumors about the player enter the prompt (spec §4.6 step 1:
/// "top-M rumors about player").
const DEFAULT_TOP_M_RUMORS: usize = 3;

/// A newly formed memory's starting strength and the minimum
/// `urgency` that produces a world event (spec §4.6 step 3(e)).
const FRESH_MEMORY_STRENGTH: f64 = 1.0;
const WORLD_EVENT_URGENCY_THRESHOLD: f64 = 0.85;

/// How long a freshly generated quest stays `Available` before it expires
/// unaccepted (spec §6 `POST /quest/generate`).
const QUEST_DEFAULT_EXPIRY_HOURS: i64 = 24;

/// Inputs one [`Brain::interact`] call needs beyond the agent's own state.
/// Brain performs no storage I/O: the caller loads these candidates and is
/// responsible for persisting the mutations and insertions
/// [`BrainOutcome`] reports back.
pub struct BrainRequest<'a> {
    pub player_id: PlayerId,
    pub utterance: &'a str,
    /// The agent's own memories about `player_id`; reinforced in place for
    /// whichever ones get retrieved into the prompt.
    pub memory_candidates: &'a mut [Memory],
    /// Rumors about `player_id` this agent has heard.
    pub rumor_candidates: &'a [Rumor],
    /// The agent's own faction, if any, for stance context and the
    /// faction-reputation ripple.
    pub faction: Option<&'a Faction>,
    /// Current `reputation(player, agent)`, `[-1, 1]`.
    pub reputation_with_player: f64,
    /// Current `reputation(player, agent.faction)`, if the agent belongs to
    /// a faction, `[-1, 1]`.
    pub reputation_with_faction: Option<f64>,
}

/// Every effect one [`Brain::interact`] call produced, already applied to
/// the passed-in `AgentState` and memory slice; the caller persists these.
pub struct BrainOutcome {
    pub frame: npc_types::CognitiveFrame,
    /// Ids and new strengths of memories reinforced by this interaction.
    pub reinforced_memory_ids: Vec<(MemoryId, f64)>,
    /// New firsthand memories to insert, built from `extractedTopics`.
    pub new_memories: Vec<Memory>,
    /// `(new reputation(player, agent), delta actually applied)`.
    pub reputation: (f64, f64),
    /// `(new reputation(player, agent.faction)), delta actually applied)`,
    /// `None` if the agent has no faction.
    pub faction_reputation: Option<(f64, f64)>,
    /// Further ripple into every faction `agent.faction` considers an
    /// enemy, keyed by the enemy faction's id.
    pub faction_ripple: BTreeMap<FactionId, f64>,
    /// Emitted when `frame.urgency >= 0.85` (spec §4.6 step 3(e)).
    pub world_event: Option<WorldEvent>,
}

/// Calls the Oracle and applies its effects for one agent's interaction.
pub struct Brain<'o> {
    oracle: &'o Oracle,
    memory_config: MemoryConfig,
    top_m_rumors: usize,
}

impl<'o> Brain<'o> {
    /// Build a Brain over a shared Oracle. Memory retrieval breadth comes
    /// from `memory_config.retrieval_limit`; rumor breadth defaults to the
    /// spec's top 3.
    #[must_use]
    pub fn new(oracle: &'o Oracle, memory_config: MemoryConfig) -> Self {
        Self {
            oracle,
            memory_config,
            top_m_rumors: DEFAULT_TOP_M_RUMORS,
        }
    }

    /// Run one full cognition-and-effects cycle (spec §4.6).
    pub async fn interact(
        &self,
        state: &mut AgentState,
        mut request: BrainRequest<'_>,
        world_time: WorldTime,
        now: DateTime<Utc>,
    ) -> BrainOutcome {
        let (context, considered_ids) = self.assemble(&state.agent, &request, world_time, None);

        let cognize_request = CognizeRequest {
            context,
            current_mood: state.agent.mood.clone(),
        };
        let frame = self.oracle.cognize(&cognize_request).await;

        apply_effects(&self.memory_config, state, &mut request, frame, considered_ids, world_time, now)
    }

    /// Run one cognition-and-effects cycle for a group speaker, seeding the
    /// prompt with the turns already taken this message so each subsequent
    /// speaker sees prior lines (spec §4.10).
    pub async fn interact_in_group(
        &self,
        state: &mut AgentState,
        mut request: BrainRequest<'_>,
        world_time: WorldTime,
        now: DateTime<Utc>,
        transcript_so_far: &[npc_types::GroupTurn],
    ) -> (npc_types::GroupTurn, BrainOutcome) {
        let (context, considered_ids) =
            self.assemble(&state.agent, &request, world_time, Some(transcript_so_far));

        let cognize_request = CognizeRequest {
            context,
            current_mood: state.agent.mood.clone(),
        };
        let frame = self.oracle.cognize(&cognize_request).await;

        let turn = npc_types::GroupTurn {
            speaker: state.agent.id,
            response_type: derive_response_type(&frame),
            addressed_to: derive_addressed_to(&frame, transcript_so_far),
            dialogue: frame.dialogue.clone(),
        };

        let outcome =
            apply_effects(&self.memory_config, state, &mut request, frame, considered_ids, world_time, now);
        (turn, outcome)
    }

    /// `Brain.quest()` (spec §6 `POST /quest/generate/{agent}?player_id=`,
    /// §3: "Quests may be generated from memories an agent holds about a
    /// player.").
    ///
    /// Reuses the same `cognize` contract as [`Brain::interact`] rather
    /// than inventing a second Oracle call shape: the prompt context asks
    /// for a quest hook instead of a conversational reply, and the
    /// resulting frame's reflection/dialogue/topics are read as the
    /// quest's description/title/type.
    pub async fn quest(
        &self,
        agent: &npc_types::Agent,
        player_id: npc_types::PlayerId,
        memories_about_player: &[Memory],
        world_time: WorldTime,
        now: DateTime<Utc>,
    ) -> npc_types::Quest {
        let retrieved = memory::retrieve(memories_about_player, &self.memory_config);
        let memory_summaries: Vec<serde_json::Value> =
            retrieved.iter().map(|m| json!({"category": m.category, "content": m.content})).collect();

        let context = json!({
            "mode": "quest_generation",
            "agent": {"id": agent.id, "role": agent.role},
            "player": player_id,
            "world_time": world_time,
            "memories": memory_summaries,
        });
        let cognize_request = CognizeRequest { context, current_mood: agent.mood.clone() };
        let frame = self.oracle.cognize(&cognize_request).await;

        let title = frame
            .extracted_topics
            .first()
            .map_or_else(|| format!("{}'s request", agent.role), |topic| topic.content.clone());
        let quest_type = frame
            .extracted_topics
            .first()
            .map_or_else(|| "errand".to_owned(), |topic| format!("{:?}", topic.category).to_lowercase());

        npc_types::Quest {
            id: npc_types::QuestId::new(),
            giver_agent: agent.id,
            quest_type,
            title,
            description: frame.reflection,
            difficulty: frame.urgency,
            expires_at: now + chrono::Duration::hours(QUEST_DEFAULT_EXPIRY_HOURS),
            rewards: std::collections::BTreeMap::new(),
            status: npc_types::QuestStatus::Available,
        }
    }

    fn assemble(
        &self,
        agent: &Agent,
        request: &BrainRequest<'_>,
        world_time: WorldTime,
        transcript_so_far: Option<&[npc_types::GroupTurn]>,
    ) -> (serde_json::Value, Vec<MemoryId>) {
        let retrieved = memory::retrieve(request.memory_candidates, &self.memory_config);
        let considered_ids = retrieved.iter().map(|m| m.id).collect::<Vec<_>>();

        let memory_summaries: Vec<serde_json::Value> = retrieved
            .iter()
            .map(|m| json!({"category": m.category, "content": m.content, "strength": m.strength}))
            .collect();

        let top_rumors = top_rumors(request.rumor_candidates, self.top_m_rumors);
        let rumor_summaries: Vec<serde_json::Value> =
            top_rumors.iter().map(|r| json!({"content": r.content, "strength": r.strength})).collect();

        let faction_stance = request.faction.map(|f| {
            json!({
                "name": f.name,
                "values": f.values,
                "reputation_with_player": request.reputation_with_faction,
            })
        });

        let goals: Vec<serde_json::Value> = agent
            .goals
            .iter()
            .filter(|g| !g.abandoned)
            .map(|g| json!({"description": g.description, "progress": g.progress}))
            .collect();

        let prior_turns: Vec<serde_json::Value> = transcript_so_far
            .unwrap_or(&[])
            .iter()
            .map(|t| json!({"speaker": t.speaker, "dialogue": t.dialogue}))
            .collect();

        let context = json!({
            "agent_role": agent.role,
            "personality": agent.personality,
            "vitals": agent.vitals,
            "mood": agent.mood,
            "world_time": world_time,
            "utterance": request.utterance,
            "memories": memory_summaries,
            "rumors": rumor_summaries,
            "faction": faction_stance,
            "goals": goals,
            "reputation_with_player": request.reputation_with_player,
            "prior_turns": prior_turns,
        });

        (context, considered_ids)
    }
}

fn apply_effects(
    memory_config: &MemoryConfig,
    state: &mut AgentState,
    request: &mut BrainRequest<'_>,
    frame: npc_types::CognitiveFrame,
    considered_ids: Vec<MemoryId>,
    world_time: WorldTime,
    now: DateTime<Utc>,
) -> BrainOutcome {
    // (a) apply the mood shift and bump last_active_at.
    state.apply_action(&frame);

    // (b) reinforce every memory that was retrieved into the prompt,
    // and insert new firsthand memories from extracted topics.
    let mut reinforced_memory_ids = Vec::new();
    for memory in request.memory_candidates.iter_mut() {
        if considered_ids.contains(&memory.id) {
            memory::reinforce(memory, memory_config, now);
            reinforced_memory_ids.push((memory.id, memory.strength));
        }
    }

    let new_memories: Vec<Memory> = frame
        .extracted_topics
        .iter()
        .map(|topic| Memory {
            id: MemoryId::new(),
            owner_agent: state.agent.id,
            subject: SubjectId::Player(request.player_id),
            category: topic.category,
            content: topic.content.clone(),
            strength: FRESH_MEMORY_STRENGTH,
            emotional_weight: frame.emotional_weight,
            created_at: now,
            last_referenced_at: now,
            ref_count: 0,
            source: None,
        })
        .collect();

    // (c) reputation(player, agent) <- clamp(rep + trustDelta).
    let reputation = reputation::apply_delta(request.reputation_with_player, frame.trust_delta);

    // (d) ripple into reputation(player, agent.faction), then further
    // into every faction agent.faction considers an enemy.
    let mut faction_reputation = None;
    let mut faction_ripple = BTreeMap::new();
    if let Some(faction) = request.faction {
        let current = request.reputation_with_faction.unwrap_or(0.0);
        let applied = reputation::apply_delta(current, FACTION_RIPPLE_FACTOR * frame.trust_delta);
        faction_ripple = reputation::ripple_to_enemies(faction, applied.1);
        faction_reputation = Some(applied);
    }

    // (e) emit a world event for high-urgency outcomes.
    let world_event = (frame.urgency >= WORLD_EVENT_URGENCY_THRESHOLD).then(|| WorldEvent {
        id: EventId::new(),
        world_time,
        kind: "brain_urgent_outcome".to_owned(),
        summary: frame.dialogue.clone(),
        details: json!({"agent": state.agent.id, "intent": frame.intent, "urgency": frame.urgency}),
        created_at: now,
    });

    BrainOutcome {
        frame,
        reinforced_memory_ids,
        new_memories,
        reputation,
        faction_reputation,
        faction_ripple,
        world_event,
    }
}

fn top_rumors<'a>(rumors: &'a [Rumor], limit: usize) -> Vec<&'a Rumor> {
    let mut ranked: Vec<&Rumor> = rumors.iter().collect();
    ranked.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(limit);
    ranked
}

/// Oracle's [`npc_types::CognitiveFrame`] carries no `response_type` or
/// `addressed_to` field -- those are group-conversation concepts Oracle's
/// single-agent contract has no reason to know about. Derive them
/// deterministically from the frame instead of extending Oracle's schema
/// for one caller.
fn derive_response_type(frame: &npc_types::CognitiveFrame) -> npc_types::ResponseType {
    use npc_types::{Intent, ResponseType};
    if frame.trust_delta <= -0.1 {
        ResponseType::Disagreement
    } else if frame.trust_delta >= 0.1 {
        ResponseType::Agreement
    } else if frame.urgency >= 0.7 {
        ResponseType::Interruption
    } else if matches!(frame.intent, Intent::Ignore) {
        ResponseType::Silent
    } else if frame.emotional_weight >= 0.6 {
        ResponseType::Elaboration
    } else {
        ResponseType::DirectReply
    }
}

/// A disagreement/interruption addresses whoever spoke last; everything
/// else addresses the player (`None`).
fn derive_addressed_to(
    frame: &npc_types::CognitiveFrame,
    transcript_so_far: &[npc_types::GroupTurn],
) -> Option<npc_types::AgentId> {
    use npc_types::ResponseType;
    match derive_response_type(frame) {
        ResponseType::Disagreement | ResponseType::Interruption | ResponseType::Redirect => {
            transcript_so_far.last().map(|t| t.speaker)
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use npc_types::{AgentId, Goal, Mood, Personality, SubjectId, Vitals};

    fn sample_agent() -> Agent {
        let now = Utc::now();
        Agent {
            id: AgentId::new(),
            role: "blacksmith".to_owned(),
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
            goals: vec![Goal::new("finish the commission")],
            voice_fingerprint: None,
            created_at: now,
            last_active_at: now,
        }
    }

    #[test]
    fn fallback_frame_still_reinforces_retrieved_memories() {
        // Brain::interact's Oracle-calling half is covered by npc-oracle's
        // own tests; this exercises the effects-application path directly
        // on the fallback frame a dead/timed-out Oracle would return.
        let mut state = AgentState::new(sample_agent());
        let player = npc_types::PlayerId::new();
        let mut memories = vec![Memory {
            id: MemoryId::new(),
            owner_agent: state.agent.id,
            subject: SubjectId::Player(player),
            category: npc_types::MemoryCategory::Event,
            content: "shared bread".to_owned(),
            strength: 0.5,
            emotional_weight: 0.2,
            created_at: Utc::now(),
            last_referenced_at: Utc::now(),
            ref_count: 0,
            source: None,
        }];
        let frame = npc_types::CognitiveFrame::fallback(&state.agent.mood.clone());
        let memory_config = MemoryConfig::default();

        let mut request = BrainRequest {
            player_id: player,
            utterance: "hello",
            memory_candidates: &mut memories,
            rumor_candidates: &[],
            faction: None,
            reputation_with_player: 0.0,
            reputation_with_faction: None,
        };

        let considered_ids = vec![request.memory_candidates[0].id];
        let outcome = apply_effects(
            &memory_config,
            &mut state,
            &mut request,
            frame,
            considered_ids,
            WorldTime::epoch(),
            Utc::now(),
        );

        assert_eq!(outcome.reinforced_memory_ids.len(), 1);
        assert!(outcome.new_memories.is_empty());
        assert!((outcome.reputation.1).abs() < 1e-9);
    }

    #[test]
    fn derive_response_type_maps_trust_and_urgency() {
        let mut frame = npc_types::CognitiveFrame::fallback(&Mood::neutral());
        frame.trust_delta = 0.15;
        assert_eq!(derive_response_type(&frame), npc_types::ResponseType::Agreement);

        frame.trust_delta = -0.15;
        assert_eq!(derive_response_type(&frame), npc_types::ResponseType::Disagreement);

        frame.trust_delta = 0.0;
        frame.urgency = 0.9;
        assert_eq!(derive_response_type(&frame), npc_types::ResponseType::Interruption);
    }

    #[test]
    fn world_event_only_fires_above_urgency_threshold() {
        assert!(WORLD_EVENT_URGENCY_THRESHOLD > 0.8);
    }
}
