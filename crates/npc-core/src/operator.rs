//! Operator control state for the `/world/start`, `/world/stop`, and
//! `/world/tick` boundary endpoints (spec §4.7, §4.12).
//!
//! This module provides shared atomic state used by the autorun loop (see
//! [`crate::runner`]) and whichever Boundary handler drives it. All
//! mutable control fields use [`std::sync::atomic`] types wrapped in
//! [`Arc`] so they can be shared between the autorun task and HTTP handler
//! tasks without a lock on the hot path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Fixed-point scale applied to `time_scale` so it fits an [`AtomicU64`];
/// mirrors [`crate::config::GroupConfig`]'s millis-encoding pattern.
const TIME_SCALE_MILLIS_SCALE: f64 = 1000.0;

/// Shared autorun control state (spec §4.7: "Autorun ... issues ticks
/// every `tickInterval` wall-seconds at `timeScale` simulated-hours per
/// tick"; spec §5: "Autorun can be stopped at any time; the current tick
/// finishes").
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the autorun loop should currently be issuing ticks.
    running: AtomicBool,
    /// Woken whenever `running` transitions to `true`, so a stopped loop
    /// doesn't busy-poll.
    start_notify: Notify,
    /// Wall-clock milliseconds between autorun ticks.
    tick_interval_ms: AtomicU64,
    /// Simulated hours per autorun tick, encoded as thousandths.
    time_scale_millis: AtomicU64,
    /// When the current (or most recent) autorun run started.
    started_at: std::sync::Mutex<Option<DateTime<Utc>>>,
}

impl OperatorState {
    /// Build operator state in the stopped state with the given defaults.
    #[must_use]
    pub fn new(tick_interval_ms: u64, time_scale: f64) -> Self {
        Self {
            running: AtomicBool::new(false),
            start_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            time_scale_millis: AtomicU64::new(to_millis(time_scale)),
            started_at: std::sync::Mutex::new(None),
        }
    }

    /// `WorldClock.run(timeScale, tickInterval)` (spec §6): start (or
    /// restart with new parameters) the autorun loop.
    pub fn start(&self, time_scale: f64, tick_interval_ms: u64) {
        self.time_scale_millis.store(to_millis(time_scale), Ordering::Release);
        self.tick_interval_ms.store(tick_interval_ms, Ordering::Release);
        self.running.store(true, Ordering::Release);
        if let Ok(mut guard) = self.started_at.lock() {
            *guard = Some(Utc::now());
        }
        self.start_notify.notify_waiters();
    }

    /// `WorldClock.halt` (spec §6): request autorun stop. The in-flight
    /// tick, if any, finishes; the loop simply does not issue another.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Whether autorun is currently issuing ticks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Block until [`Self::start`] is called, if not already running.
    pub async fn wait_until_running(&self) {
        while !self.is_running() {
            self.start_notify.notified().await;
        }
    }

    /// Current autorun tick interval in wall-clock milliseconds.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Current autorun `time_scale`, in simulated hours per tick.
    #[must_use]
    pub fn time_scale(&self) -> f64 {
        from_millis(self.time_scale_millis.load(Ordering::Acquire))
    }

    /// Wall-clock time the current (or most recent) autorun run started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at.lock().ok().and_then(|guard| *guard)
    }
}

fn to_millis(value: f64) -> u64 {
    if !value.is_finite() || value < 0.0 {
        return 0;
    }
    (value * TIME_SCALE_MILLIS_SCALE).round() as u64
}

fn from_millis(millis: u64) -> f64 {
    (millis as f64) / TIME_SCALE_MILLIS_SCALE
}

/// JSON-serializable autorun status for a Boundary status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutorunStatus {
    pub running: bool,
    pub tick_interval_ms: u64,
    pub time_scale: f64,
    pub started_at: Option<DateTime<Utc>>,
}

impl OperatorState {
    /// Snapshot the current autorun status.
    #[must_use]
    pub fn status(&self) -> AutorunStatus {
        AutorunStatus {
            running: self.is_running(),
            tick_interval_ms: self.tick_interval_ms(),
            time_scale: self.time_scale(),
            started_at: self.started_at(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped_by_default() {
        let operator = OperatorState::new(1000, 1.0);
        assert!(!operator.is_running());
    }

    #[test]
    fn start_sets_running_and_params() {
        let operator = OperatorState::new(1000, 1.0);
        operator.start(2.5, 500);
        assert!(operator.is_running());
        assert_eq!(operator.tick_interval_ms(), 500);
        assert!((operator.time_scale() - 2.5).abs() < 1e-9);
        assert!(operator.started_at().is_some());
    }

    #[test]
    fn stop_clears_running_but_keeps_params() {
        let operator = OperatorState::new(1000, 1.0);
        operator.start(2.5, 500);
        operator.stop();
        assert!(!operator.is_running());
        assert_eq!(operator.tick_interval_ms(), 500);
    }

    #[tokio::test]
    async fn wait_until_running_returns_immediately_once_started() {
        let operator = std::sync::Arc::new(OperatorState::new(1000, 1.0));
        operator.start(1.0, 100);
        tokio::time::timeout(std::time::Duration::from_millis(50), operator.wait_until_running())
            .await
            .expect("should not block once running");
    }
}
