//! Per-trigger failure tracking and fallback value substitution
//! (spec.md §3.4, §8 "Fallback transition").

use std::collections::BTreeMap;

use engine_core::{FallbackBehavior, FallbackPolicy, FallbackScope};

use crate::scaler::Sample;

/// Consecutive-failure counters for every trigger in one target, keyed by
/// trigger index. A failed poll increments the owning trigger's counter; a
/// successful poll resets it to zero (spec.md §8 scenario: "after one
/// successful poll, counter resets").
#[derive(Debug, Clone, Default)]
pub struct FailureTracker {
    counts: BTreeMap<usize, u32>,
}

impl FailureTracker {
    /// Record a failed poll for `trigger_index`.
    pub fn record_failure(&mut self, trigger_index: usize) {
        *self.counts.entry(trigger_index).or_insert(0) += 1;
    }

    /// Record a successful poll for `trigger_index`, resetting its streak.
    pub fn record_success(&mut self, trigger_index: usize) {
        self.counts.insert(trigger_index, 0);
    }

    /// Consecutive failures currently recorded for `trigger_index`.
    #[must_use]
    pub fn consecutive_failures(&self, trigger_index: usize) -> u32 {
        self.counts.get(&trigger_index).copied().unwrap_or(0)
    }

    /// Whether `trigger_index` has reached `policy.failure_threshold`.
    #[must_use]
    pub fn is_in_fallback(&self, trigger_index: usize, policy: &FallbackPolicy) -> bool {
        self.consecutive_failures(trigger_index) >= policy.failure_threshold
    }
}

/// Outcome of applying a fallback policy across one target's triggers for
/// one poll.
#[derive(Debug, Clone)]
pub struct FallbackOutcome {
    /// Samples after fallback substitution/exclusion.
    pub samples: Vec<Sample>,
    /// Whether the target as a whole is currently in fallback.
    pub in_fallback: bool,
}

/// Apply a target's fallback policy to one poll's raw per-trigger samples.
///
/// `raw_by_trigger` carries this round's samples for triggers that polled
/// successfully; a trigger absent from it failed this round. `names_by_trigger`
/// carries every built trigger's published metric name regardless of
/// whether it produced a sample this round, so a fallback-eligible trigger
/// that just failed (and so has no entry in `raw_by_trigger`) can still
/// publish a substituted sample under its own name (spec.md §8 property 4:
/// "after exactly three consecutive failed polls, the next metric read
/// returns [the fallback value]"). `current_replicas` feeds the
/// `currentReplicas*` behaviors.
#[must_use]
pub fn apply(
    policy: Option<&FallbackPolicy>,
    tracker: &FailureTracker,
    raw_by_trigger: &BTreeMap<usize, Vec<Sample>>,
    names_by_trigger: &BTreeMap<usize, String>,
    trigger_count: usize,
    current_replicas: i32,
) -> FallbackOutcome {
    let Some(policy) = policy else {
        // No policy: pass through whatever succeeded; failed triggers
        // simply contribute nothing.
        let samples = raw_by_trigger.values().flatten().cloned().collect();
        return FallbackOutcome { samples, in_fallback: false };
    };

    let fallback_value = f64::from(policy.resolve(current_replicas));
    let mut samples = Vec::new();
    let mut any_in_fallback = false;
    let mut all_in_fallback = true;

    for idx in 0..trigger_count {
        let in_fallback = tracker.is_in_fallback(idx, policy);
        if in_fallback {
            any_in_fallback = true;
        } else {
            all_in_fallback = false;
        }

        match (in_fallback, policy.scope, raw_by_trigger.get(&idx)) {
            (false, _, Some(raw)) => samples.extend(raw.iter().cloned()),
            (false, _, None) => {
                // Not yet in fallback (a transient failure below
                // threshold) and nothing published this round: contribute
                // nothing, same as an absent trigger.
            }
            (true, FallbackScope::Target, _) => {
                // Target-scoped fallback: substitute the fallback value for
                // whatever this trigger would have published, keyed by its
                // own metric name even when this round produced no raw
                // sample to borrow the name from.
                if let Some(name) = names_by_trigger.get(&idx) {
                    samples.push(Sample { name: name.clone(), value: fallback_value });
                }
            }
            (true, FallbackScope::PerTrigger, _) => {
                // Trigger-scoped: exclude this trigger entirely and let the
                // remaining scaling formula absorb the loss.
            }
        }
    }

    FallbackOutcome {
        samples,
        in_fallback: match policy.scope {
            FallbackScope::Target => any_in_fallback,
            FallbackScope::PerTrigger => all_in_fallback && trigger_count > 0,
        },
    }
}

/// Whether `behavior` ever needs the workload's current replica count.
#[must_use]
pub fn needs_current_replicas(behavior: FallbackBehavior) -> bool {
    !matches!(behavior, FallbackBehavior::Static)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FallbackPolicy {
        FallbackPolicy {
            failure_threshold: 3,
            replicas: 5,
            behavior: FallbackBehavior::Static,
            scope: FallbackScope::Target,
        }
    }

    #[test]
    fn three_consecutive_failures_trigger_fallback() {
        let mut tracker = FailureTracker::default();
        tracker.record_failure(0);
        tracker.record_failure(0);
        assert!(!tracker.is_in_fallback(0, &policy()));
        tracker.record_failure(0);
        assert!(tracker.is_in_fallback(0, &policy()));
    }

    #[test]
    fn success_resets_counter() {
        let mut tracker = FailureTracker::default();
        for _ in 0..3 {
            tracker.record_failure(0);
        }
        assert!(tracker.is_in_fallback(0, &policy()));
        tracker.record_success(0);
        assert!(!tracker.is_in_fallback(0, &policy()));
    }

    #[test]
    fn fallback_substitutes_value_when_target_scoped() {
        let mut tracker = FailureTracker::default();
        for _ in 0..3 {
            tracker.record_failure(0);
        }
        let raw = BTreeMap::new();
        let names = BTreeMap::from([(0, "kafka".to_string())]);
        let outcome = apply(Some(&policy()), &tracker, &raw, &names, 1, 2);
        assert!(outcome.in_fallback);
        assert_eq!(outcome.samples, vec![Sample { name: "kafka".to_string(), value: 5.0 }]);
    }

    #[test]
    fn sub_threshold_failure_contributes_nothing() {
        let mut tracker = FailureTracker::default();
        tracker.record_failure(0);
        let raw = BTreeMap::new();
        let names = BTreeMap::from([(0, "kafka".to_string())]);
        let outcome = apply(Some(&policy()), &tracker, &raw, &names, 1, 2);
        assert!(!outcome.in_fallback);
        assert!(outcome.samples.is_empty());
    }
}
