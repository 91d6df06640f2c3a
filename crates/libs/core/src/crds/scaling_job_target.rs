//! `ScalingJobTarget` — per-event job dispatch (spec.md §3.1).

use k8s_openapi::api::batch::v1::JobSpec;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::Condition;
use crate::fallback::FallbackPolicy;
use crate::trigger::Trigger;
use chrono::{DateTime, Utc};

/// Which formula computes `effectiveMaxScale` each tick (spec.md §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum ScalingStrategy {
    /// `aggregated - running`.
    #[default]
    Default,
    /// `min(aggregated - running, maxReplicaCount)` after a ceiling clamp.
    Accurate,
    /// `min(aggregated - customQueueLengthDeduction -
    /// running * customRunningJobPercentage, maxReplicaCount)`.
    Custom,
}

/// What happens to in-flight jobs when the spec changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum JobRolloutStrategy {
    /// Leave running jobs to complete.
    #[default]
    Default,
    /// Proactively delete running jobs.
    Immediate,
}

/// Declares a batch-job template plus a trigger list; each active tick
/// dispatches 0..N jobs from the template subject to `max_replica_count`.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "ScalingJobTarget",
    namespaced,
    status = "ScalingJobTargetStatus",
    shortname = "sjt"
)]
#[serde(rename_all = "camelCase")]
pub struct ScalingJobTargetSpec {
    /// Template for each dispatched `batch/v1` `Job`.
    pub job_target_ref: JobSpec,

    /// Ordered list of triggers.
    pub triggers: Vec<Trigger>,

    /// Hard ceiling on concurrent jobs (`running + pending <=
    /// max_replica_count`, invariant 4).
    pub max_replica_count: i32,

    /// Successful job history retained, oldest pruned first.
    #[serde(default = "default_history_limit")]
    pub successful_jobs_history_limit: i32,

    /// Failed job history retained, oldest pruned first.
    #[serde(default = "default_history_limit")]
    pub failed_jobs_history_limit: i32,

    /// Which `effectiveMaxScale` formula to use.
    #[serde(default)]
    pub scaling_strategy: ScalingStrategy,

    /// Deduction applied by [`ScalingStrategy::Custom`].
    #[serde(default)]
    pub custom_queue_length_deduction: i32,

    /// Fraction of running jobs subtracted by [`ScalingStrategy::Custom`].
    #[serde(default)]
    pub custom_running_job_percentage: f64,

    /// What to do with in-flight jobs on a spec change.
    #[serde(default)]
    pub rollout_strategy: JobRolloutStrategy,

    /// Interval in seconds between dispatch ticks.
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u32,

    /// Fallback policy, same shape as `ScalingTarget`'s.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPolicy>,
}

fn default_history_limit() -> i32 {
    5
}

fn default_polling_interval() -> u32 {
    30
}

/// Status of a `ScalingJobTarget`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalingJobTargetStatus {
    /// `Ready`/`Active`/`Fallback` condition set.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// When a trigger was last observed active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active_time: Option<DateTime<Utc>>,

    /// Fingerprint of the resolved configuration last used to build this
    /// target's scaler cache entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_fingerprint: Option<String>,

    /// Generation last reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
