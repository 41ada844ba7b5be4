//! Tunable constants for vital decay and memory dynamics.
//!
//! Bundled into structs so callers (the world-clock tick loop, tests) can
//! override defaults without touching call sites.

/// Configuration for per-agent vital decay, applied every tick (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalsConfig {
    /// Hunger gained per simulated hour (default: 0.25, i.e. full in 4h).
    pub hunger_per_hour: f64,
    /// Fatigue gained per simulated hour (default: 1/6, i.e. full in 6h).
    pub fatigue_per_hour: f64,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            hunger_per_hour: 0.25,
            fatigue_per_hour: 1.0 / 6.0,
        }
    }
}

impl VitalsConfig {
    /// Hunger delta for `elapsed_hours`, before the `min(1, ...)` clamp.
    #[must_use]
    pub fn hunger_delta(&self, elapsed_hours: f64) -> f64 {
        self.hunger_per_hour * elapsed_hours
    }

    /// Fatigue delta for `elapsed_hours`, before the `min(1, ...)` clamp.
    #[must_use]
    pub fn fatigue_delta(&self, elapsed_hours: f64) -> f64 {
        self.fatigue_per_hour * elapsed_hours
    }
}

/// Configuration for memory decay, reinforcement, retrieval, and gossip
/// (spec §4.4). The spec fixes the decay/reinforcement *shape* but not
/// every constant; `lambda` and `reinforcement_alpha` are chosen here and
/// recorded in the grounding ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryConfig {
    /// Decay rate in the exponential rule `s <- s * exp(-lambda * dh * (1 - w))`.
    pub lambda: f64,
    /// Reinforcement rate in `s <- min(1, s + alpha * (1 - s))`.
    pub reinforcement_alpha: f64,
    /// Default cap on retrieved memories for prompt assembly (spec §4.4).
    pub retrieval_limit: usize,
    /// Top-`M` strongest shareable memories considered by a gossip share.
    pub gossip_top_m: usize,
    /// Multiplier applied to a shared memory's strength beyond trust (spec
    /// §4.4: `strength = origStrength * trust(to->from) * 0.7`).
    pub gossip_decay_factor: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            lambda: 0.05,
            reinforcement_alpha: 0.2,
            retrieval_limit: 8,
            gossip_top_m: 3,
            gossip_decay_factor: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vitals_defaults_match_spec_rates() {
        let cfg = VitalsConfig::default();
        assert!((cfg.hunger_delta(4.0) - 1.0).abs() < 1e-9);
        assert!((cfg.fatigue_delta(6.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn memory_defaults_are_sane() {
        let cfg = MemoryConfig::default();
        assert_eq!(cfg.retrieval_limit, 8);
        assert!(cfg.lambda > 0.0);
        assert!((0.0..=1.0).contains(&cfg.reinforcement_alpha));
    }
}
