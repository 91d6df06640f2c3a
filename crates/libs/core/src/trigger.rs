//! The `Trigger` sub-document shared by `ScalingTargetSpec` and
//! `ScalingJobTargetSpec`.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a trigger's metric value relates to the replica count the autoscaler
/// computes from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MetricType {
    /// The raw metric value is the target.
    Value,
    /// The metric value is averaged across all replicas.
    AverageValue,
    /// The metric value is a percentage of a per-replica capacity.
    Utilization,
}

/// A single sub-declaration inside a target, naming one scaler type and its
/// metadata.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Trigger {
    /// Selects one of the registered scaler implementations, e.g. `kafka`,
    /// `prometheus`, `cron`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Optional user-facing name; defaults to `type_` when absent. Used to
    /// derive the published metric name before disambiguation.
    #[serde(default)]
    pub name: Option<String>,

    /// Scaler-specific configuration. Validated by the owning scaler's
    /// factory, not by this crate.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Reference to a `TriggerAuthentication` or `ClusterTriggerAuthentication`
    /// supplying credentials for this trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_ref: Option<AuthenticationRef>,

    /// How the metric value relates to the replica count. Defaults to
    /// `AverageValue`, matching the autoscaler's own default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,

    /// When `true`, the metrics adapter serves the scaler runtime's
    /// last-known value instead of forcing a fresh poll.
    #[serde(default)]
    pub use_cached_metrics: bool,
}

impl Trigger {
    /// The name used to register this trigger's published metric before
    /// collision disambiguation (invariant 2 in spec.md §3.2).
    #[must_use]
    pub fn base_metric_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.type_.clone())
    }
}

/// Reference to a (cluster-scoped or namespaced) authentication object.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuthenticationRef {
    /// Name of the `TriggerAuthentication` or `ClusterTriggerAuthentication`.
    pub name: String,

    /// When `true`, resolves against `ClusterTriggerAuthentication` instead
    /// of the namespaced kind.
    #[serde(default)]
    pub kind: AuthenticationRefKind,
}

/// Which authentication kind an [`AuthenticationRef`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum AuthenticationRefKind {
    /// Namespaced `TriggerAuthentication`.
    #[default]
    TriggerAuthentication,
    /// Cluster-scoped `ClusterTriggerAuthentication`.
    ClusterTriggerAuthentication,
}

/// Disambiguate metric names within one target: each trigger produces a
/// uniquely named metric, appending the trigger's index when names would
/// otherwise collide (invariant 2).
#[must_use]
pub fn disambiguate_metric_names(triggers: &[Trigger]) -> Vec<String> {
    let mut seen: BTreeMap<String, u32> = BTreeMap::new();
    for t in triggers {
        *seen.entry(t.base_metric_name()).or_insert(0) += 1;
    }

    let mut emitted: BTreeMap<String, u32> = BTreeMap::new();
    triggers
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            let base = t.base_metric_name();
            if seen.get(&base).copied().unwrap_or(0) > 1 {
                let name = format!("{base}-{idx}");
                *emitted.entry(base).or_insert(0) += 1;
                name
            } else {
                base
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trig(type_: &str, name: Option<&str>) -> Trigger {
        Trigger {
            type_: type_.to_string(),
            name: name.map(str::to_string),
            metadata: BTreeMap::new(),
            authentication_ref: None,
            metric_type: None,
            use_cached_metrics: false,
        }
    }

    #[test]
    fn unique_names_pass_through() {
        let triggers = vec![trig("kafka", None), trig("prometheus", None)];
        let names = disambiguate_metric_names(&triggers);
        assert_eq!(names, vec!["kafka".to_string(), "prometheus".to_string()]);
    }

    #[test]
    fn colliding_names_get_index_suffix() {
        let triggers = vec![trig("cron", None), trig("cron", None)];
        let names = disambiguate_metric_names(&triggers);
        assert_eq!(names, vec!["cron-0".to_string(), "cron-1".to_string()]);
    }

    #[test]
    fn explicit_names_still_disambiguate_on_collision() {
        let triggers = vec![trig("kafka", Some("queue")), trig("redis-streams", Some("queue"))];
        let names = disambiguate_metric_names(&triggers);
        assert_eq!(names, vec!["queue-0".to_string(), "queue-1".to_string()]);
    }
}
