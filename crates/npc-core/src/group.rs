//! Group conversation orchestration (spec §4.10).
//!
//! `GroupOrchestrator` owns [`ConversationGroup`] lifecycle and turn-taking.
//! It does not call the Oracle itself -- that is [`crate::brain`]'s job, one
//! speaker at a time -- but it decides *which* participants get a turn and
//! in what order, and folds each speaker's response back into group state
//! (history, tension) once [`crate::brain`] has produced it.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use npc_types::{AgentId, ConversationGroup, GroupId, GroupTurn, PlayerId, ResponseType, ZonePosition};

use crate::config::GroupConfig;

/// Errors from group orchestration.
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    /// No group exists with the given id.
    #[error("group not found: {0}")]
    NotFound(GroupId),

    /// The group has already ended or auto-expired.
    #[error("group closed: {0}")]
    Closed(GroupId),

    /// A group was started with zero NPC participants.
    #[error("a group must have at least one NPC participant")]
    NoParticipants,

    /// Too many distinct speakers attempted to claim the same message turn.
    #[error("speaker {0} already took a turn this message")]
    DuplicateSpeaker(AgentId),

    /// A turn named a speaker who is not a current participant of the group.
    #[error("speaker {0} is not a participant of this group")]
    UnknownSpeaker(AgentId),
}

/// Inputs the caller supplies per participant when scoring whose turn it is
/// next (spec §4.10: "salience score per participant").
#[derive(Debug, Clone, Copy, Default)]
pub struct SalienceInputs {
    /// `familiarity(agent, player)`, `[0, 1]`.
    pub familiarity: f64,
    /// `interest(agent, topic)`, `[0, 1]`.
    pub interest: f64,
    /// The agent's `paranoia` personality trait, `[0, 1]`.
    pub paranoia: f64,
    /// Ticks since this agent last spoke in this group (saturating).
    pub ticks_since_last_spoke: u32,
}

/// `familiarity + w1*interest + w2*tension*paranoia - w3*(ticksSinceLastSpoke < 2)`
/// (spec §4.10).
#[must_use]
pub fn salience_score(inputs: &SalienceInputs, group_tension: f64, config: &GroupConfig) -> f64 {
    let recency_penalty = if inputs.ticks_since_last_spoke < 2 { 1.0 } else { 0.0 };
    inputs.familiarity + config.w1() * inputs.interest + config.w2() * group_tension * inputs.paranoia
        - config.w3() * recency_penalty
}

/// Rank participants by [`salience_score`], most salient first.
#[must_use]
pub fn rank_by_salience(
    participants: &[(AgentId, SalienceInputs)],
    group_tension: f64,
    config: &GroupConfig,
) -> Vec<AgentId> {
    let mut scored: Vec<(AgentId, f64)> = participants
        .iter()
        .map(|(id, inputs)| (*id, salience_score(inputs, group_tension, config)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(id, _)| id).collect()
}

/// `tension <- clamp(tension + 0.15*|disagreement+interruption| - 0.05*|agreement|)`
/// (spec §4.10), applied once per turn taken.
#[must_use]
pub fn update_tension(current: f64, response_type: ResponseType) -> f64 {
    let delta = match response_type {
        ResponseType::Disagreement | ResponseType::Interruption => 0.15,
        ResponseType::Agreement => -0.05,
        ResponseType::DirectReply
        | ResponseType::Elaboration
        | ResponseType::Redirect
        | ResponseType::Silent => 0.0,
    };
    (current + delta).clamp(0.0, 1.0)
}

/// Owns all live [`ConversationGroup`]s and their lifecycle.
#[derive(Debug, Default)]
pub struct GroupOrchestrator {
    groups: std::collections::BTreeMap<GroupId, ConversationGroup>,
}

impl GroupOrchestrator {
    /// An orchestrator with no open groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `start(player, npcIds, location)` (spec §4.10). The explicit
    /// participant set form; for `auto` participants, the caller resolves
    /// [`crate::proximity::ProximityIndex::nearby`] first and passes the
    /// result here.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NoParticipants`] if `npc_ids` is empty.
    pub fn start(
        &mut self,
        player: PlayerId,
        npc_ids: BTreeSet<AgentId>,
        location: Option<ZonePosition>,
        now: DateTime<Utc>,
    ) -> Result<GroupId, GroupError> {
        if npc_ids.is_empty() {
            return Err(GroupError::NoParticipants);
        }
        let id = GroupId::new();
        self.groups.insert(
            id,
            ConversationGroup {
                id,
                participants: npc_ids,
                player_id: player,
                location,
                history: Vec::new(),
                tension: 0.0,
                created_at: now,
                last_activity_at: now,
            },
        );
        Ok(id)
    }

    /// Read a group's current state.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists.
    pub fn get(&self, id: GroupId) -> Result<&ConversationGroup, GroupError> {
        self.groups.get(&id).ok_or(GroupError::NotFound(id))
    }

    /// Add an agent to a live group mid-conversation.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists.
    pub fn add_agent(&mut self, id: GroupId, agent: AgentId, now: DateTime<Utc>) -> Result<(), GroupError> {
        let group = self.groups.get_mut(&id).ok_or(GroupError::NotFound(id))?;
        group.participants.insert(agent);
        group.last_activity_at = now;
        Ok(())
    }

    /// Remove an agent from a live group mid-conversation.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists.
    pub fn remove_agent(&mut self, id: GroupId, agent: AgentId, now: DateTime<Utc>) -> Result<(), GroupError> {
        let group = self.groups.get_mut(&id).ok_or(GroupError::NotFound(id))?;
        group.participants.remove(&agent);
        group.last_activity_at = now;
        Ok(())
    }

    /// `end(group)` (spec §4.10): finalize and drop the group.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists.
    pub fn end(&mut self, id: GroupId) -> Result<ConversationGroup, GroupError> {
        self.groups.remove(&id).ok_or(GroupError::NotFound(id))
    }

    /// Rank this group's current participants by salience, most salient
    /// first, for the caller to drive per-speaker Brain calls.
    ///
    /// `salience_of` supplies the per-participant inputs the orchestrator
    /// has no visibility into (familiarity, interest, paranoia, turn
    /// recency); the caller derives these from agent/relation state.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists, or
    /// [`GroupError::Closed`] if it has no participants left.
    pub fn turn_order(
        &self,
        id: GroupId,
        config: &GroupConfig,
        salience_of: impl Fn(AgentId) -> SalienceInputs,
    ) -> Result<Vec<AgentId>, GroupError> {
        let group = self.groups.get(&id).ok_or(GroupError::NotFound(id))?;
        if group.participants.is_empty() {
            return Err(GroupError::Closed(id));
        }
        let scored: Vec<(AgentId, SalienceInputs)> =
            group.participants.iter().map(|&id| (id, salience_of(id))).collect();
        Ok(rank_by_salience(&scored, group.tension, config))
    }

    /// Record one speaker's turn: append it to history (unless
    /// [`ResponseType::Silent`], which is filtered before effects per spec),
    /// update tension, and bump `last_activity_at`.
    ///
    /// A speaker who already appears in `turns_this_message` is rejected --
    /// each participant speaks at most once per incoming message.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::NotFound`] if no such group exists, or
    /// [`GroupError::DuplicateSpeaker`] if `turn.speaker` already spoke this
    /// message.
    pub fn record_turn(
        &mut self,
        id: GroupId,
        turn: GroupTurn,
        turns_this_message: &[GroupTurn],
        now: DateTime<Utc>,
    ) -> Result<(), GroupError> {
        if turns_this_message.iter().any(|t| t.speaker == turn.speaker) {
            return Err(GroupError::DuplicateSpeaker(turn.speaker));
        }
        let group = self.groups.get_mut(&id).ok_or(GroupError::NotFound(id))?;
        if !group.participants.contains(&turn.speaker) {
            return Err(GroupError::UnknownSpeaker(turn.speaker));
        }
        if turn.response_type != ResponseType::Silent {
            group.tension = update_tension(group.tension, turn.response_type);
            group.history.push(turn);
        }
        group.last_activity_at = now;
        Ok(())
    }

    /// Sweep idle groups: remove any group whose `last_activity_at` is
    /// older than [`GroupConfig::group_idle_timeout_secs`], returning the
    /// ids removed.
    pub fn expire_idle(&mut self, now: DateTime<Utc>, config: &GroupConfig) -> Vec<GroupId> {
        let timeout = chrono::Duration::seconds(i64::try_from(config.group_idle_timeout_secs).unwrap_or(i64::MAX));
        let expired: Vec<GroupId> = self
            .groups
            .iter()
            .filter(|(_, g)| now.signed_duration_since(g.last_activity_at) >= timeout)
            .map(|(&id, _)| id)
            .collect();
        for id in &expired {
            self.groups.remove(id);
        }
        expired
    }

    /// Number of groups currently open.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no open groups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn turn(speaker: AgentId, response_type: ResponseType) -> GroupTurn {
        GroupTurn {
            speaker,
            response_type,
            addressed_to: None,
            dialogue: "hi".to_owned(),
        }
    }

    #[test]
    fn start_requires_at_least_one_npc() {
        let mut orchestrator = GroupOrchestrator::new();
        let result = orchestrator.start(PlayerId::new(), BTreeSet::new(), None, Utc::now());
        assert!(matches!(result, Err(GroupError::NoParticipants)));
    }

    #[test]
    fn salience_prefers_familiar_interested_agents() {
        let config = GroupConfig::default();
        let high = SalienceInputs {
            familiarity: 0.9,
            interest: 0.9,
            paranoia: 0.1,
            ticks_since_last_spoke: 10,
        };
        let low = SalienceInputs {
            familiarity: 0.1,
            interest: 0.1,
            paranoia: 0.1,
            ticks_since_last_spoke: 10,
        };
        assert!(salience_score(&high, 0.0, &config) > salience_score(&low, 0.0, &config));
    }

    #[test]
    fn recency_penalty_applies_under_two_ticks() {
        let config = GroupConfig::default();
        let recent = SalienceInputs {
            ticks_since_last_spoke: 0,
            ..Default::default()
        };
        let stale = SalienceInputs {
            ticks_since_last_spoke: 5,
            ..Default::default()
        };
        assert!(salience_score(&recent, 0.0, &config) < salience_score(&stale, 0.0, &config));
    }

    #[test]
    fn tension_rises_on_disagreement_and_falls_on_agreement() {
        let after_disagree = update_tension(0.3, ResponseType::Disagreement);
        assert!(after_disagree > 0.3);
        let after_agree = update_tension(0.3, ResponseType::Agreement);
        assert!(after_agree < 0.3);
        assert!((0.0..=1.0).contains(&after_disagree));
        assert!((0.0..=1.0).contains(&after_agree));
    }

    #[test]
    fn tension_clamps_at_bounds() {
        assert!((update_tension(0.95, ResponseType::Disagreement) - 1.0).abs() < 1e-9);
        assert!(update_tension(0.0, ResponseType::Agreement).abs() < 1e-9);
    }

    #[test]
    fn silent_turns_are_filtered_from_history() {
        let mut orchestrator = GroupOrchestrator::new();
        let npc = AgentId::new();
        let mut participants = BTreeSet::new();
        participants.insert(npc);
        let now = Utc::now();
        let id = orchestrator.start(PlayerId::new(), participants, None, now).unwrap();

        orchestrator
            .record_turn(id, turn(npc, ResponseType::Silent), &[], now)
            .unwrap();
        assert!(orchestrator.get(id).unwrap().history.is_empty());
    }

    #[test]
    fn duplicate_speaker_in_same_message_is_rejected() {
        let mut orchestrator = GroupOrchestrator::new();
        let npc = AgentId::new();
        let mut participants = BTreeSet::new();
        participants.insert(npc);
        let now = Utc::now();
        let id = orchestrator.start(PlayerId::new(), participants, None, now).unwrap();

        let already_spoke = vec![turn(npc, ResponseType::DirectReply)];
        let result = orchestrator.record_turn(id, turn(npc, ResponseType::Agreement), &already_spoke, now);
        assert!(matches!(result, Err(GroupError::DuplicateSpeaker(_))));
    }

    #[test]
    fn idle_groups_expire_after_timeout() {
        let mut orchestrator = GroupOrchestrator::new();
        let npc = AgentId::new();
        let mut participants = BTreeSet::new();
        participants.insert(npc);
        let old_time = Utc::now() - chrono::Duration::seconds(700);
        let id = orchestrator.start(PlayerId::new(), participants, None, old_time).unwrap();

        let expired = orchestrator.expire_idle(Utc::now(), &GroupConfig::default());
        assert_eq!(expired, vec![id]);
        assert!(orchestrator.get(id).is_err());
    }

    #[test]
    fn turn_from_non_participant_is_rejected() {
        let mut orchestrator = GroupOrchestrator::new();
        let npc = AgentId::new();
        let stranger = AgentId::new();
        let mut participants = BTreeSet::new();
        participants.insert(npc);
        let now = Utc::now();
        let id = orchestrator.start(PlayerId::new(), participants, None, now).unwrap();

        let result = orchestrator.record_turn(id, turn(stranger, ResponseType::DirectReply), &[], now);
        assert!(matches!(result, Err(GroupError::UnknownSpeaker(_))));
    }

    #[test]
    fn unknown_speaker_operations_return_not_found() {
        let mut orchestrator = GroupOrchestrator::new();
        let bogus = GroupId::new();
        assert!(matches!(orchestrator.get(bogus), Err(GroupError::NotFound(_))));
        assert!(matches!(orchestrator.end(bogus), Err(GroupError::NotFound(_))));
    }
}
