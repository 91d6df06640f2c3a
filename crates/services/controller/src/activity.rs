//! Activity / idle / cooldown state machine (spec.md §4.1 "Activity and
//! idle transitions", §8 property 2 "Cooldown correctness").
//!
//! Generalizes the teacher's `ScalerState` scale-down cooldown timer
//! (tracked per-Deployment, reset on every scale-down) into a per-target
//! "seconds since last observed activity" timer that gates the
//! active-to-idle transition, reset by activity from *any* trigger.

use chrono::{DateTime, Utc};

/// Tracks one target's activity history across polls.
#[derive(Debug, Clone)]
pub struct ActivityState {
    /// Timestamp of the most recent poll in which any trigger reported
    /// active, or crossed its activation threshold. `None` before the
    /// first observed activity.
    last_active_at: Option<DateTime<Utc>>,
}

impl ActivityState {
    /// A target with no activity history yet.
    #[must_use]
    pub fn new() -> Self {
        Self { last_active_at: None }
    }

    /// Record this poll's aggregate activity. `now` lets callers and tests
    /// control the clock explicitly rather than reading it twice.
    pub fn observe(&mut self, is_active: bool, now: DateTime<Utc>) {
        if is_active {
            self.last_active_at = Some(now);
        }
    }

    /// Whether the target should be driven to `idleReplicas` at `now`,
    /// i.e. at least `cooldown_period` seconds have elapsed since the last
    /// observed activity (or activity has never been observed at all).
    #[must_use]
    pub fn should_idle(&self, cooldown_period_seconds: u32, now: DateTime<Utc>) -> bool {
        match self.last_active_at {
            None => true,
            Some(last_active) => {
                let elapsed = now.signed_duration_since(last_active);
                elapsed >= chrono::Duration::seconds(i64::from(cooldown_period_seconds))
            }
        }
    }
}

impl Default for ActivityState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_active_is_idle_immediately() {
        let state = ActivityState::new();
        assert!(state.should_idle(300, Utc::now()));
    }

    #[test]
    fn stays_non_idle_within_cooldown() {
        let mut state = ActivityState::new();
        let t0 = Utc::now();
        state.observe(true, t0);
        state.observe(false, t0 + chrono::Duration::seconds(10));
        assert!(!state.should_idle(300, t0 + chrono::Duration::seconds(100)));
    }

    #[test]
    fn idles_after_cooldown_elapses() {
        let mut state = ActivityState::new();
        let t0 = Utc::now();
        state.observe(true, t0);
        state.observe(false, t0 + chrono::Duration::seconds(10));
        assert!(state.should_idle(300, t0 + chrono::Duration::seconds(311)));
    }

    #[test]
    fn activity_from_any_poll_resets_cooldown() {
        let mut state = ActivityState::new();
        let t0 = Utc::now();
        state.observe(true, t0);
        // Activity observed again at t0+200, before the first window's cooldown elapses.
        state.observe(true, t0 + chrono::Duration::seconds(200));
        assert!(!state.should_idle(300, t0 + chrono::Duration::seconds(400)));
    }
}
