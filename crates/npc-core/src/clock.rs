//! World clock tracking for the simulation (spec §4.7).
//!
//! The clock's only temporal state is a monotonic minute counter; `day`,
//! `hour`, `minute` and `total_hours` are derived from it on every read,
//! never stored independently, mirroring the tick-counter-is-truth
//! discipline this crate has always used for its temporal state.
//!
//! The clock also owns the simulation's process-wide RNG: per spec §5,
//! "RNG: owned by WorldClock only; Brain uses a separate RNG seeded
//! per-agent." Anything drawing randomness during a tick (faction trade
//! rolls, gossip selection) borrows it from here rather than keeping its
//! own source.
//!
//! # Design Principles
//!
//! - All temporal derivations use checked arithmetic (no silent overflow).
//! - `WorldTime` is always derived from the minute counter, never advanced
//!   piecemeal.
//! - The clock itself does not decide *when* to advance: a manual tick
//!   supplies its own `delta_hours`, and an autorun driver (see
//!   [`crate::runner`]) supplies `time_scale` on a wall-clock interval.

use npc_types::WorldTime;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::TimeConfig;

const MINUTES_PER_HOUR: u64 = 60;
const HOURS_PER_DAY: u64 = 24;

/// Seed used by [`WorldClock::new`] and [`WorldClock::default`]. Callers
/// that need a distinct reproducible run should use [`WorldClock::with_seed`].
const DEFAULT_SEED: u64 = 0;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Advancing the clock would overflow the minute counter.
    #[error("world clock overflow: cannot advance beyond u64::MAX minutes")]
    Overflow,

    /// A requested advance was not a finite, non-negative number of hours.
    #[error("invalid advance: {reason}")]
    InvalidAdvance {
        /// Explanation of what is wrong with the requested delta.
        reason: String,
    },
}

/// World clock tracking the simulation's elapsed time and owning the
/// process-wide tick RNG (spec §4.7, §5).
///
/// Supports two driving modes: a manual tick that advances by an explicit
/// `delta_hours` (default 1.0), and an autorun mode (see [`crate::runner`])
/// that advances by `time_scale` simulated hours on a fixed wall-clock
/// interval. Both paths call [`WorldClock::advance`].
pub struct WorldClock {
    /// Monotonic count of simulated minutes elapsed since world start.
    total_minutes: u64,
    rng: StdRng,
}

impl WorldClock {
    /// Create a clock at the epoch (day 0, hour 0, minute 0), seeded from
    /// [`DEFAULT_SEED`]. Use [`WorldClock::with_seed`] for a reproducible
    /// run with a config-supplied seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Create a clock at the epoch with an explicit RNG seed, as config
    /// supplies at process start (spec §5: "the RNG is process-owned and
    /// seeded from config").
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            total_minutes: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restore a clock from a previously observed [`WorldTime`] (used when
    /// rehydrating simulation state from storage).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Overflow`] if `total_hours` cannot be expressed
    /// in minutes without overflowing `u64`.
    pub fn from_world_time(time: WorldTime, seed: u64) -> Result<Self, ClockError> {
        let total_minutes = time
            .total_hours
            .checked_mul(MINUTES_PER_HOUR)
            .ok_or(ClockError::Overflow)?;
        Ok(Self {
            total_minutes,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// The default manual-tick advance, per [`TimeConfig::manual_tick_hours`].
    #[must_use]
    pub fn default_tick_hours(config: &TimeConfig) -> f64 {
        config.manual_tick_hours
    }

    /// Advance the clock by `delta_hours` simulated hours and return the
    /// resulting [`WorldTime`].
    ///
    /// `delta_hours` is rounded to the nearest simulated minute; this is the
    /// only place fractional hours are resolved to the clock's integer
    /// minute counter.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidAdvance`] if `delta_hours` is negative,
    /// not finite, or rounds to zero minutes. Returns [`ClockError::Overflow`]
    /// if the new minute counter would exceed `u64::MAX`.
    pub fn advance(&mut self, delta_hours: f64) -> Result<WorldTime, ClockError> {
        if !delta_hours.is_finite() || delta_hours < 0.0 {
            return Err(ClockError::InvalidAdvance {
                reason: format!("delta_hours must be finite and non-negative, got {delta_hours}"),
            });
        }

        let minutes_f = (delta_hours * (MINUTES_PER_HOUR as f64)).round();
        if minutes_f < 1.0 {
            return Err(ClockError::InvalidAdvance {
                reason: "delta_hours rounds to zero minutes".to_owned(),
            });
        }
        // minutes_f is bounded above by delta_hours * 60 and already checked
        // finite and positive; a delta large enough to overflow u64 minutes
        // represents a configuration error, not a value worth clamping.
        let delta_minutes = minutes_f as u64;

        self.total_minutes = self
            .total_minutes
            .checked_add(delta_minutes)
            .ok_or(ClockError::Overflow)?;
        Ok(self.now())
    }

    /// Current simulated time, derived from the minute counter.
    #[must_use]
    pub fn now(&self) -> WorldTime {
        let total_hours = self.total_minutes.checked_div(MINUTES_PER_HOUR).unwrap_or(0);
        let minute = self.total_minutes.checked_rem(MINUTES_PER_HOUR).unwrap_or(0);
        let day = total_hours.checked_div(HOURS_PER_DAY).unwrap_or(0);
        let hour = total_hours.checked_rem(HOURS_PER_DAY).unwrap_or(0);

        // minute and hour are both bounded below 60/24 by construction above
        // and fit comfortably in u32.
        WorldTime {
            day,
            hour: u32::try_from(hour).unwrap_or(0),
            minute: u32::try_from(minute).unwrap_or(0),
            total_hours,
        }
    }

    /// The process-wide tick RNG. The only legitimate source of randomness
    /// for tick-driven mechanics (faction trade rolls, NPC-to-NPC gossip
    /// selection); Brain draws from its own per-agent RNG instead.
    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl std::fmt::Debug for WorldClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldClock")
            .field("total_minutes", &self.total_minutes)
            .finish_non_exhaustive()
    }
}

impl Default for WorldClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn default_time_config() -> TimeConfig {
        TimeConfig::default()
    }

    #[test]
    fn clock_starts_at_epoch() {
        let clock = WorldClock::new();
        assert_eq!(clock.now(), WorldTime::epoch());
    }

    #[test]
    fn default_manual_tick_is_one_hour() {
        let cfg = default_time_config();
        assert!((WorldClock::default_tick_hours(&cfg) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn advance_by_one_hour_updates_total_hours() {
        let mut clock = WorldClock::new();
        let time = clock.advance(1.0).unwrap();
        assert_eq!(time.total_hours, 1);
        assert_eq!(time.day, 0);
        assert_eq!(time.hour, 1);
        assert_eq!(time.minute, 0);
    }

    #[test]
    fn advance_accumulates_fractional_hours_into_minutes() {
        let mut clock = WorldClock::new();
        clock.advance(0.5).unwrap();
        let time = clock.advance(0.5).unwrap();
        assert_eq!(time.total_hours, 1);
        assert_eq!(time.minute, 0);
    }

    #[test]
    fn advance_rolls_over_day_boundary() {
        let mut clock = WorldClock::new();
        let time = clock.advance(25.0).unwrap();
        assert_eq!(time.day, 1);
        assert_eq!(time.hour, 1);
        assert_eq!(time.total_hours, 25);
    }

    #[test]
    fn negative_advance_is_rejected() {
        let mut clock = WorldClock::new();
        assert!(clock.advance(-1.0).is_err());
    }

    #[test]
    fn non_finite_advance_is_rejected() {
        let mut clock = WorldClock::new();
        assert!(clock.advance(f64::NAN).is_err());
        assert!(clock.advance(f64::INFINITY).is_err());
    }

    #[test]
    fn sub_minute_advance_is_rejected() {
        let mut clock = WorldClock::new();
        assert!(clock.advance(0.001).is_err());
    }

    #[test]
    fn from_world_time_restores_state() {
        let time = WorldTime {
            day: 2,
            hour: 3,
            minute: 0,
            total_hours: 51,
        };
        let clock = WorldClock::from_world_time(time, DEFAULT_SEED).unwrap();
        assert_eq!(clock.now().total_hours, 51);
    }

    #[test]
    fn with_seed_is_deterministic_across_instances() {
        use rand::Rng;
        let mut a = WorldClock::with_seed(7);
        let mut b = WorldClock::with_seed(7);
        let draw_a: f64 = a.rng_mut().random();
        let draw_b: f64 = b.rng_mut().random();
        assert!((draw_a - draw_b).abs() < f64::EPSILON);
    }
}
