//! Per-agent cognitive state and its mutation operations (spec §4.3).
//!
//! `AgentState` owns one agent's personality, vitals, mood, and goals.
//! Every trait mutation passes through [`soft_clamp_sigmoid`] so no trait
//! ever leaves `[TRAIT_FLOOR, TRAIT_CEILING]`, and appends exactly one
//! [`DeltaLogEntry`] for the trait actually changed.

use chrono::Utc;
use npc_types::{Agent, CognitiveFrame, DeltaLogEntry, Goal, TRAIT_CEILING, TRAIT_FLOOR};

use crate::error::AgentError;

/// Map a current trait value and a proposed delta through a logit-space
/// sigmoid so the result always lands strictly inside
/// `[TRAIT_FLOOR, TRAIT_CEILING]`, with diminishing effect near the edges.
#[must_use]
pub fn soft_clamp_sigmoid(x: f64, delta: f64) -> f64 {
    let range = TRAIT_CEILING - TRAIT_FLOOR;
    let normalized = ((x - TRAIT_FLOOR) / range).clamp(1e-6, 1.0 - 1e-6);
    let logit = (normalized / (1.0 - normalized)).ln();
    let shifted = logit + delta;
    let sigmoid = 1.0 / (1.0 + (-shifted).exp());
    TRAIT_FLOOR + range * sigmoid
}

fn trait_mut(agent: &mut Agent, trait_name: &str) -> Option<&mut f64> {
    match trait_name {
        "curiosity" => Some(&mut agent.personality.curiosity),
        "cooperation" => Some(&mut agent.personality.cooperation),
        "aggression" => Some(&mut agent.personality.aggression),
        "risk_tolerance" => Some(&mut agent.personality.risk_tolerance),
        "industriousness" => Some(&mut agent.personality.industriousness),
        "sociability" => Some(&mut agent.personality.sociability),
        "honesty" => Some(&mut agent.personality.honesty),
        "loyalty" => Some(&mut agent.personality.loyalty),
        "paranoia" => Some(&mut agent.personality.paranoia),
        _ => None,
    }
}

/// Owns one agent's mutable state. A single task per agent should hold this
/// at a time (spec §4.3's single-writer invariant); the mailbox discipline
/// enforcing that lives in `npc-core`, not here.
#[derive(Debug, Clone)]
pub struct AgentState {
    pub agent: Agent,
    pub delta_log: Vec<DeltaLogEntry>,
}

impl AgentState {
    #[must_use]
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            delta_log: Vec::new(),
        }
    }

    /// Apply a personality trait delta through the soft-clamp sigmoid and
    /// append a Delta-Log entry (spec §4.3).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidArgument`] if `trait_name` is not one of
    /// the nine named traits.
    pub fn apply_trait_delta(
        &mut self,
        trait_name: &str,
        delta: f64,
        reason: impl Into<String>,
    ) -> Result<(), AgentError> {
        let from = {
            let slot = trait_mut(&mut self.agent, trait_name)
                .ok_or_else(|| AgentError::InvalidArgument(format!("unknown trait: {trait_name}")))?;
            *slot
        };
        let to = soft_clamp_sigmoid(from, delta);
        if let Some(slot) = trait_mut(&mut self.agent, trait_name) {
            *slot = to;
        }
        self.delta_log.push(DeltaLogEntry {
            trait_name: trait_name.to_owned(),
            from,
            to,
            delta,
            reason: reason.into(),
            at: Utc::now(),
        });
        Ok(())
    }

    /// Advance hunger and fatigue by `elapsed_hours` of decay (spec §4.3:
    /// `hunger += Δh/4`, `fatigue += Δh/6`, both capped at `1.0`).
    pub fn apply_vital_decay(&mut self, elapsed_hours: f64, config: &crate::config::VitalsConfig) {
        self.agent.vitals.hunger =
            (self.agent.vitals.hunger + config.hunger_delta(elapsed_hours)).min(1.0);
        self.agent.vitals.fatigue =
            (self.agent.vitals.fatigue + config.fatigue_delta(elapsed_hours)).min(1.0);
    }

    /// Apply a cognitive frame's mood shift to the agent's current mood,
    /// bounding both components to `[0, 1]` (spec §4.3).
    pub fn apply_action(&mut self, frame: &CognitiveFrame) {
        self.agent.mood.arousal = (self.agent.mood.arousal + frame.mood_shift_arousal).clamp(0.0, 1.0);
        self.agent.mood.valence = (self.agent.mood.valence + frame.mood_shift_valence).clamp(0.0, 1.0);
        self.agent.last_active_at = Utc::now();
    }

    /// Add a new autonomous goal.
    pub fn set_goal(&mut self, description: impl Into<String>) {
        self.agent.goals.push(Goal::new(description));
    }

    /// Advance the first non-abandoned goal matching `description` by `delta`,
    /// clamped to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GoalNotFound`] if no live goal matches.
    pub fn progress_goal(&mut self, description: &str, delta: f64) -> Result<(), AgentError> {
        let goal = self
            .agent
            .goals
            .iter_mut()
            .find(|g| g.description == description && !g.abandoned)
            .ok_or_else(|| AgentError::GoalNotFound {
                agent: self.agent.id,
                description: description.to_owned(),
            })?;
        goal.progress = (goal.progress + delta).clamp(0.0, 1.0);
        Ok(())
    }

    /// Mark a goal abandoned with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GoalNotFound`] if no live goal matches.
    pub fn abandon_goal(
        &mut self,
        description: &str,
        reason: impl Into<String>,
    ) -> Result<(), AgentError> {
        let goal = self
            .agent
            .goals
            .iter_mut()
            .find(|g| g.description == description && !g.abandoned)
            .ok_or_else(|| AgentError::GoalNotFound {
                agent: self.agent.id,
                description: description.to_owned(),
            })?;
        goal.abandoned = true;
        goal.abandon_reason = Some(reason.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npc_types::{Mood, Personality, Vitals};

    fn sample_agent() -> Agent {
        let now = Utc::now();
        Agent {
            id: npc_types::AgentId::new(),
            role: "merchant".to_owned(),
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

    #[test]
    fn soft_clamp_stress_never_leaves_bounds() {
        let mut x = 0.5;
        for _ in 0..1000 {
            x = soft_clamp_sigmoid(x, 0.5);
            assert!(x >= TRAIT_FLOOR && x <= TRAIT_CEILING);
        }
    }

    #[test]
    fn apply_trait_delta_logs_exactly_one_entry() {
        let mut state = AgentState::new(sample_agent());
        state.apply_trait_delta("cooperation", 0.2, "helped a neighbor").unwrap_or(());
        assert_eq!(state.delta_log.len(), 1);
        let entry = &state.delta_log[0];
        assert!((entry.from + entry.delta - soft_clamp_sigmoid(entry.from, entry.delta)).abs() < 1e-9);
    }

    #[test]
    fn apply_trait_delta_rejects_unknown_trait() {
        let mut state = AgentState::new(sample_agent());
        assert!(state.apply_trait_delta("empathy", 0.1, "n/a").is_err());
    }

    #[test]
    fn vital_decay_saturates_at_one() {
        let mut state = AgentState::new(sample_agent());
        state.apply_vital_decay(100.0, &crate::config::VitalsConfig::default());
        assert!((state.agent.vitals.hunger - 1.0).abs() < 1e-9);
        assert!((state.agent.vitals.fatigue - 1.0).abs() < 1e-9);
    }

    #[test]
    fn progress_and_abandon_goal_round_trip() {
        let mut state = AgentState::new(sample_agent());
        state.set_goal("open a stall");
        state.progress_goal("open a stall", 0.3).expect("goal exists");
        assert!((state.agent.goals[0].progress - 0.3).abs() < 1e-9);
        state.abandon_goal("open a stall", "ran out of coin").expect("goal exists");
        assert!(state.agent.goals[0].abandoned);
    }
}
