//! Fallback policy (spec.md §3.4).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What replaces a failed trigger's contribution once its consecutive
/// failure count reaches `failure_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FallbackBehavior {
    /// Always use `replicas`.
    Static,
    /// Use the workload's current replica count.
    CurrentReplicas,
    /// Use the current replica count only if it exceeds `replicas`.
    CurrentReplicasIfHigher,
    /// Use the current replica count only if it is below `replicas`.
    CurrentReplicasIfLower,
}

/// Whether a fallback applies to the whole target or independently per
/// trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FallbackScope {
    /// A single failed trigger forces the whole target into fallback.
    #[default]
    Target,
    /// Each trigger falls back independently; healthy triggers keep
    /// steering the remaining scaling formula.
    PerTrigger,
}

/// `{ failureThreshold, replicas, behavior }` from spec.md §3.4.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FallbackPolicy {
    /// Consecutive failed polls before fallback engages.
    pub failure_threshold: u32,
    /// Replica count used by [`FallbackBehavior::Static`] and as the
    /// comparison point for the other behaviors.
    pub replicas: i32,
    /// How the fallback value is computed.
    #[serde(default = "default_behavior")]
    pub behavior: FallbackBehavior,
    /// Whether failures are scoped per-trigger or to the whole target.
    #[serde(default)]
    pub scope: FallbackScope,
}

fn default_behavior() -> FallbackBehavior {
    FallbackBehavior::Static
}

impl FallbackPolicy {
    /// Resolve the fallback value given the workload's current replica
    /// count, per the behavior in effect.
    #[must_use]
    pub fn resolve(&self, current_replicas: i32) -> i32 {
        match self.behavior {
            FallbackBehavior::Static => self.replicas,
            FallbackBehavior::CurrentReplicas => current_replicas,
            FallbackBehavior::CurrentReplicasIfHigher => current_replicas.max(self.replicas),
            FallbackBehavior::CurrentReplicasIfLower => current_replicas.min(self.replicas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(behavior: FallbackBehavior) -> FallbackPolicy {
        FallbackPolicy {
            failure_threshold: 3,
            replicas: 5,
            behavior,
            scope: FallbackScope::Target,
        }
    }

    #[test]
    fn static_behavior_ignores_current() {
        assert_eq!(policy(FallbackBehavior::Static).resolve(100), 5);
    }

    #[test]
    fn current_replicas_if_higher() {
        let p = policy(FallbackBehavior::CurrentReplicasIfHigher);
        assert_eq!(p.resolve(10), 10);
        assert_eq!(p.resolve(1), 5);
    }

    #[test]
    fn current_replicas_if_lower() {
        let p = policy(FallbackBehavior::CurrentReplicasIfLower);
        assert_eq!(p.resolve(10), 5);
        assert_eq!(p.resolve(1), 1);
    }
}
