//! Agent tiering: classifies agents into activity tiers and decides which
//! ones a given tick actually processes (spec §4.8).
//!
//! Reclassification is `O(agents)` per tick. Active and Nearby agents never
//! skip a tick; Idle and Dormant agents may be skipped ("slip") under an
//! advisory wall-clock budget, since their state changes slowly enough that
//! a tick's delay costs nothing observable.

use std::time::Duration;

use chrono::{DateTime, Utc};
use npc_types::Tier;

use crate::config::TieringConfig;

/// Errors from tiering operations.
#[derive(Debug, thiserror::Error)]
pub enum TieringError {
    /// A worker pool size computation produced zero or an otherwise
    /// unusable pool size.
    #[error("invalid tier worker pool size: {reason}")]
    InvalidPoolSize {
        /// Explanation of what went wrong.
        reason: String,
    },
}

/// Classify one agent's current tier.
///
/// `in_conversation` and `near_player` are evaluated by the caller (the
/// former from [`crate::group`], the latter from [`crate::proximity`])
/// since this module has no knowledge of groups or player positions.
#[must_use]
pub fn classify(
    last_active_at: DateTime<Utc>,
    now: DateTime<Utc>,
    in_conversation: bool,
    near_player: bool,
    config: &TieringConfig,
) -> Tier {
    let idle_for = now.signed_duration_since(last_active_at);
    let idle_secs = idle_for.num_seconds().max(0);

    if in_conversation || idle_secs < i64::try_from(config.active_window_secs).unwrap_or(i64::MAX) {
        return Tier::Active;
    }
    if near_player {
        return Tier::Nearby;
    }
    if idle_secs >= i64::try_from(config.dormant_after_secs).unwrap_or(i64::MAX) {
        return Tier::Dormant;
    }
    Tier::Idle
}

/// Whether an agent in `tier` should be processed on `tick_index` (the
/// monotonic count of ticks executed so far, 0-indexed).
///
/// Active and Nearby ticks always run their scheduled stride to completion;
/// Idle and Dormant may be reported as due and still slip to the next tick
/// under [`TierBudget`] if the wall-clock budget for the current tick has
/// already run out.
#[must_use]
pub fn is_due(tier: Tier, tick_index: u64, config: &TieringConfig) -> bool {
    let stride = match tier {
        Tier::Active => 1,
        Tier::Nearby => config.nearby_tick_stride.max(1),
        Tier::Idle => config.idle_tick_stride.max(1),
        Tier::Dormant => config.dormant_tick_stride.max(1),
    };
    tick_index.checked_rem(stride).unwrap_or(0) == 0
}

/// Tracks an advisory wall-clock budget for one tick and decides whether
/// Idle/Dormant work should slip once the budget is exhausted.
///
/// Active and Nearby agents are never offered to this budget check; callers
/// must process them unconditionally.
#[derive(Debug)]
pub struct TierBudget {
    deadline: std::time::Instant,
}

impl TierBudget {
    /// Start a new budget window of `budget` wall-clock time from now.
    #[must_use]
    pub fn start(budget: Duration) -> Self {
        Self {
            deadline: std::time::Instant::now() + budget,
        }
    }

    /// Whether there is still budget remaining for more Idle/Dormant work
    /// this tick.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        std::time::Instant::now() < self.deadline
    }
}

/// Size of the bounded worker pool for one tier, proportional to available
/// CPU parallelism and capped by [`TieringConfig::max_tier_workers`].
///
/// # Errors
///
/// Returns [`TieringError::InvalidPoolSize`] if `available_parallelism`
/// cannot be determined and no fallback is usable.
pub fn worker_pool_size(config: &TieringConfig) -> Result<usize, TieringError> {
    let cpus = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1);
    if cpus == 0 {
        return Err(TieringError::InvalidPoolSize {
            reason: "available_parallelism reported zero".to_owned(),
        });
    }
    Ok(cpus.min(config.max_tier_workers.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn config() -> TieringConfig {
        TieringConfig::default()
    }

    #[test]
    fn in_conversation_is_always_active() {
        let now = Utc::now();
        let tier = classify(now - ChronoDuration::hours(10), now, true, false, &config());
        assert_eq!(tier, Tier::Active);
    }

    #[test]
    fn recently_interacted_is_active() {
        let now = Utc::now();
        let tier = classify(now - ChronoDuration::seconds(5), now, false, false, &config());
        assert_eq!(tier, Tier::Active);
    }

    #[test]
    fn near_player_but_quiet_is_nearby() {
        let now = Utc::now();
        let tier = classify(now - ChronoDuration::minutes(5), now, false, true, &config());
        assert_eq!(tier, Tier::Nearby);
    }

    #[test]
    fn quiet_and_far_is_idle_until_dormant_threshold() {
        let now = Utc::now();
        let tier = classify(now - ChronoDuration::minutes(5), now, false, false, &config());
        assert_eq!(tier, Tier::Idle);
    }

    #[test]
    fn long_silence_is_dormant() {
        let now = Utc::now();
        let tier = classify(now - ChronoDuration::hours(2), now, false, false, &config());
        assert_eq!(tier, Tier::Dormant);
    }

    #[test]
    fn active_and_nearby_are_always_due() {
        let cfg = config();
        for tick in 0..20u64 {
            assert!(is_due(Tier::Active, tick, &cfg));
        }
        for tick in (0..20u64).step_by(2) {
            assert!(is_due(Tier::Nearby, tick, &cfg));
        }
    }

    #[test]
    fn idle_and_dormant_skip_ticks() {
        let cfg = config();
        assert!(!is_due(Tier::Idle, 1, &cfg));
        assert!(is_due(Tier::Idle, 8, &cfg));
    }

    #[test]
    fn worker_pool_never_exceeds_cap() {
        let cfg = TieringConfig {
            max_tier_workers: 2,
            ..config()
        };
        let size = worker_pool_size(&cfg).unwrap_or(0);
        assert!(size <= 2);
        assert!(size >= 1);
    }

    #[test]
    fn budget_reports_exhausted_after_zero_duration() {
        let budget = TierBudget::start(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!budget.has_remaining());
    }
}
