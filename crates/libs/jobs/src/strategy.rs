//! `effectiveMaxScale` formulas (spec.md §4.4).
//!
//! Each tick the dispatch loop knows three numbers: `aggregated`, the
//! ceiling implied by the triggers' queue-depth-style metrics (the sum of
//! `ceil(metric_value / target_per_replica)` across triggers, computed
//! upstream by `engine-scalers`); `running`, the count of jobs currently
//! classified [`crate::classify::JobState::Running`]; and `pending`, the
//! count classified [`crate::classify::JobState::Pending`]. These formulas
//! turn that into how many *new* jobs to dispatch this tick.

use engine_core::crds::ScalingStrategy;

/// Inputs to an `effectiveMaxScale` computation.
#[derive(Debug, Clone, Copy)]
pub struct StrategyInput {
    /// Aggregated desired job count implied by trigger metrics.
    pub aggregated: i64,
    /// Jobs currently running (spec.md §4.4: includes succeeded-but-not-yet-GC'd).
    pub running: i64,
    /// Jobs currently pending.
    pub pending: i64,
    /// `maxReplicaCount` from the spec.
    pub max_replica_count: i32,
    /// `customQueueLengthDeduction`, used only by [`ScalingStrategy::Custom`].
    pub custom_queue_length_deduction: i32,
    /// `customRunningJobPercentage`, used only by [`ScalingStrategy::Custom`].
    pub custom_running_job_percentage: f64,
}

/// Compute how many new jobs to dispatch this tick, already clamped to
/// `[0, maxReplicaCount - running - pending]` (invariant 4: `running +
/// pending <= maxReplicaCount` must hold after dispatch).
#[must_use]
pub fn jobs_to_dispatch(strategy: ScalingStrategy, input: StrategyInput) -> i64 {
    let max = i64::from(input.max_replica_count);
    let occupied = input.running + input.pending;
    let headroom = (max - occupied).max(0);

    let desired = match strategy {
        ScalingStrategy::Default => (input.aggregated - input.running).max(0),
        ScalingStrategy::Accurate => {
            if input.aggregated + input.running > max {
                (max - input.running).max(0)
            } else {
                (input.aggregated - input.pending).max(0)
            }
        }
        ScalingStrategy::Custom => {
            let deduction = i64::from(input.custom_queue_length_deduction);
            #[allow(clippy::cast_possible_truncation)]
            let running_deduction = (input.running as f64 * input.custom_running_job_percentage).round() as i64;
            (input.aggregated - deduction - running_deduction).max(0).min(max)
        }
    };

    desired.min(headroom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> StrategyInput {
        StrategyInput {
            aggregated: 0,
            running: 0,
            pending: 0,
            max_replica_count: 10,
            custom_queue_length_deduction: 0,
            custom_running_job_percentage: 0.0,
        }
    }

    #[test]
    fn default_subtracts_running() {
        let input = StrategyInput { aggregated: 10, running: 4, ..base() };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Default, input), 6);
    }

    #[test]
    fn default_never_goes_negative() {
        let input = StrategyInput { aggregated: 2, running: 5, ..base() };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Default, input), 0);
    }

    #[test]
    fn accurate_clamps_when_over_max() {
        // aggregated + running (12 + 4 = 16) > max (10) -> max - running = 6
        let input = StrategyInput { aggregated: 12, running: 4, max_replica_count: 10, ..base() };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Accurate, input), 6);
    }

    #[test]
    fn accurate_subtracts_pending_when_under_max() {
        let input = StrategyInput { aggregated: 5, pending: 2, max_replica_count: 10, ..base() };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Accurate, input), 3);
    }

    #[test]
    fn custom_applies_deduction_and_running_percentage() {
        // aggregated=20, deduction=5, running=4 * 0.5 = 2 -> 20 - 5 - 2 = 13, min(13, max=10) = 10
        let input = StrategyInput {
            aggregated: 20,
            running: 4,
            custom_queue_length_deduction: 5,
            custom_running_job_percentage: 0.5,
            max_replica_count: 10,
            ..base()
        };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Custom, input), 10);
    }

    #[test]
    fn result_never_exceeds_headroom() {
        // invariant 4: running + pending + dispatched <= maxReplicaCount
        let input = StrategyInput { aggregated: 50, running: 8, pending: 1, max_replica_count: 10, ..base() };
        assert_eq!(jobs_to_dispatch(ScalingStrategy::Default, input), 1);
    }
}
