//! Typed configuration for the components this crate owns.
//!
//! These structs are loaded by `npc-engine`'s layered configuration (the
//! `config` crate: defaults + YAML + environment overrides) and passed in
//! by reference; this crate itself performs no file I/O or env lookups,
//! it only declares the shapes and their defaults.

use serde::{Deserialize, Serialize};

/// Time configuration for [`crate::clock::WorldClock`] (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TimeConfig {
    /// Simulated hours a manual `/world/tick` advances by default.
    #[serde(default = "default_manual_tick_hours")]
    pub manual_tick_hours: f64,

    /// Wall-clock seconds between autorun ticks.
    #[serde(default = "default_tick_interval_seconds")]
    pub tick_interval_seconds: f64,

    /// Simulated hours advanced per autorun tick.
    ///
    /// Fixed at `1.0` by default: the more conservative of two contradictory
    /// defaults in this component's originating design notes.
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            manual_tick_hours: default_manual_tick_hours(),
            tick_interval_seconds: default_tick_interval_seconds(),
            time_scale: default_time_scale(),
        }
    }
}

const fn default_manual_tick_hours() -> f64 {
    1.0
}

const fn default_tick_interval_seconds() -> f64 {
    10.0
}

const fn default_time_scale() -> f64 {
    1.0
}

/// Tiering configuration (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TieringConfig {
    /// An agent counts as `Active` if it interacted less than this many
    /// seconds ago, or is in a live conversation.
    #[serde(default = "default_active_window_secs")]
    pub active_window_secs: u64,

    /// An agent with no activity for at least this long is `Dormant`.
    #[serde(default = "default_dormant_after_secs")]
    pub dormant_after_secs: u64,

    /// Every Nth tick a `Nearby` agent is processed.
    #[serde(default = "default_nearby_tick_stride")]
    pub nearby_tick_stride: u64,

    /// Every Nth tick an `Idle` agent is processed.
    #[serde(default = "default_idle_tick_stride")]
    pub idle_tick_stride: u64,

    /// Ticks between `Dormant` heartbeats, at one tick per
    /// [`TimeConfig::manual_tick_hours`] this is roughly hourly.
    #[serde(default = "default_dormant_tick_stride")]
    pub dormant_tick_stride: u64,

    /// Upper bound on the per-tier worker pool size, regardless of CPU count.
    #[serde(default = "default_max_tier_workers")]
    pub max_tier_workers: usize,
}

impl Default for TieringConfig {
    fn default() -> Self {
        Self {
            active_window_secs: default_active_window_secs(),
            dormant_after_secs: default_dormant_after_secs(),
            nearby_tick_stride: default_nearby_tick_stride(),
            idle_tick_stride: default_idle_tick_stride(),
            dormant_tick_stride: default_dormant_tick_stride(),
            max_tier_workers: default_max_tier_workers(),
        }
    }
}

const fn default_active_window_secs() -> u64 {
    60
}

const fn default_dormant_after_secs() -> u64 {
    1800
}

const fn default_nearby_tick_stride() -> u64 {
    2
}

const fn default_idle_tick_stride() -> u64 {
    8
}

const fn default_dormant_tick_stride() -> u64 {
    1
}

const fn default_max_tier_workers() -> usize {
    32
}

/// Proximity index configuration (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ProximityConfig {
    /// Default "nearby" radius, in world units, and the grid cell edge the
    /// spatial index is built from.
    #[serde(default = "default_nearby_radius")]
    pub nearby_radius: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            nearby_radius: default_nearby_radius(),
        }
    }
}

const fn default_nearby_radius() -> f64 {
    10.0
}

/// Group conversation configuration (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct GroupConfig {
    /// Idle groups auto-expire after this many seconds of inactivity.
    #[serde(default = "default_group_idle_timeout_secs")]
    pub group_idle_timeout_secs: u64,

    /// Salience weight on `interest(agent, topic)`.
    #[serde(default = "default_salience_w1")]
    pub salience_w1_millis: u64,

    /// Salience weight on `tension * paranoia(agent)`.
    #[serde(default = "default_salience_w2")]
    pub salience_w2_millis: u64,

    /// Salience penalty weight for agents who spoke within the last 2 turns.
    #[serde(default = "default_salience_w3")]
    pub salience_w3_millis: u64,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            group_idle_timeout_secs: default_group_idle_timeout_secs(),
            salience_w1_millis: default_salience_w1(),
            salience_w2_millis: default_salience_w2(),
            salience_w3_millis: default_salience_w3(),
        }
    }
}

impl GroupConfig {
    /// `w1` as a float, for use in the salience formula.
    #[must_use]
    pub fn w1(&self) -> f64 {
        millis_to_f64(self.salience_w1_millis)
    }

    /// `w2` as a float, for use in the salience formula.
    #[must_use]
    pub fn w2(&self) -> f64 {
        millis_to_f64(self.salience_w2_millis)
    }

    /// `w3` as a float, for use in the salience formula.
    #[must_use]
    pub fn w3(&self) -> f64 {
        millis_to_f64(self.salience_w3_millis)
    }
}

fn millis_to_f64(millis: u64) -> f64 {
    let Ok(as_i32) = i32::try_from(millis) else {
        return f64::from(i32::MAX) / 1000.0;
    };
    f64::from(as_i32) / 1000.0
}

const fn default_group_idle_timeout_secs() -> u64 {
    600
}

const fn default_salience_w1() -> u64 {
    500
}

const fn default_salience_w2() -> u64 {
    300
}

const fn default_salience_w3() -> u64 {
    400
}

/// Faction engine configuration (spec §4.11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct FactionConfig {
    /// Half-life, in simulated hours, that unpinned faction relation scores
    /// drift toward zero over.
    #[serde(default = "default_relation_half_life_hours")]
    pub relation_half_life_hours: u64,
}

impl Default for FactionConfig {
    fn default() -> Self {
        Self {
            relation_half_life_hours: default_relation_half_life_hours(),
        }
    }
}

const fn default_relation_half_life_hours() -> u64 {
    48
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_config_default_matches_spec() {
        let cfg = TimeConfig::default();
        assert!((cfg.manual_tick_hours - 1.0).abs() < f64::EPSILON);
        assert!((cfg.time_scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tiering_config_default_caps_workers_at_32() {
        assert_eq!(TieringConfig::default().max_tier_workers, 32);
    }

    #[test]
    fn group_config_idle_timeout_defaults_to_ten_minutes() {
        assert_eq!(GroupConfig::default().group_idle_timeout_secs, 600);
    }

    #[test]
    fn faction_config_half_life_defaults_to_48_hours() {
        assert_eq!(FactionConfig::default().relation_half_life_hours, 48);
    }

    #[test]
    fn group_config_weights_round_trip_through_millis() {
        let cfg = GroupConfig::default();
        assert!((cfg.w1() - 0.5).abs() < 1e-9);
        assert!((cfg.w2() - 0.3).abs() < 1e-9);
        assert!((cfg.w3() - 0.4).abs() < 1e-9);
    }
}
