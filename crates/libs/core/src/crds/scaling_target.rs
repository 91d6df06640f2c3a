//! `ScalingTarget` — continuous replica scaling (spec.md §3.1).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::Condition;
use crate::fallback::FallbackPolicy;
use crate::trigger::Trigger;

/// A polymorphic reference to the workload being scaled, analogous to the
/// autoscaler's own `scaleTargetRef`. Any kind supporting the scale
/// subresource is valid.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScaleTargetRef {
    /// API version of the referenced kind, e.g. `"apps/v1"`.
    pub api_version: String,
    /// Kind of the referenced object, e.g. `"Deployment"`.
    pub kind: String,
    /// Name of the referenced object.
    pub name: String,
}

/// Declares that a workload should be scaled between `min_replicas` and
/// `max_replicas` according to an ordered list of triggers.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "ScalingTarget",
    namespaced,
    status = "ScalingTargetStatus",
    shortname = "st"
)]
#[serde(rename_all = "camelCase")]
pub struct ScalingTargetSpec {
    /// The workload to scale.
    pub scale_target_ref: ScaleTargetRef,

    /// Minimum replicas the companion autoscaler will request.
    pub min_replicas: i32,

    /// Maximum replicas the companion autoscaler will request.
    pub max_replicas: i32,

    /// A distinct replica count below `min_replicas`, used only when no
    /// trigger is active. Unset unless `min_replicas > 0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_replicas: Option<i32>,

    /// Minimum seconds of continuous inactivity before scaling down to
    /// `idle_replicas` (or 0 if unset).
    #[serde(default = "default_cooldown_period")]
    pub cooldown_period: u32,

    /// Interval in seconds between scaler polls.
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u32,

    /// Ordered list of triggers; each names one scaler and its metadata.
    pub triggers: Vec<Trigger>,

    /// Replacement value used when a trigger has failed repeatedly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPolicy>,

    /// Whether the controller should restore `status.original_replica_count`
    /// on deletion.
    #[serde(default)]
    pub restore_to_original_replica_count: bool,

    /// Combines this target's trigger outputs through a small `??`-coalesce
    /// formula into one metric, which replaces the per-trigger metrics the
    /// autoscaler would otherwise see (spec.md §4.2 "Composite/meta
    /// scalers").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaling_modifiers: Option<ScalingModifiers>,
}

fn default_cooldown_period() -> u32 {
    300
}

fn default_polling_interval() -> u32 {
    30
}

/// A `scalingModifiers` declaration: the coalesce formula plus the final
/// target value the autoscaler scales the composite metric against.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalingModifiers {
    /// A `??`-separated chain of trigger metric names with an optional
    /// trailing numeric literal default, e.g. `"primary ?? secondary ?? 8"`.
    pub formula: String,

    /// The value the composite metric is compared against to derive a
    /// replica count.
    pub target: f64,

    /// Published name of the composite metric. Defaults to
    /// `"scalingModifiers"`.
    #[serde(default = "default_scaling_modifiers_metric_name")]
    pub metric_name: String,
}

fn default_scaling_modifiers_metric_name() -> String {
    "scalingModifiers".to_string()
}

/// Status of a `ScalingTarget`, written solely by the controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScalingTargetStatus {
    /// `Ready`/`Active`/`Fallback`/`Paused` condition set.
    #[serde(default)]
    pub conditions: Vec<Condition>,

    /// Replica count captured at creation, used to restore on deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_replica_count: Option<i32>,

    /// Name of the derived companion autoscaler object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companion_autoscaler_name: Option<String>,

    /// Fingerprint of the resolved configuration last used to build this
    /// target's scaler cache entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_fingerprint: Option<String>,

    /// Generation last reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}
