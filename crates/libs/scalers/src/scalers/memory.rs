//! `memory` trigger — average memory utilization across the scaled
//! workload's pods, read from the cluster's resource-metrics API. Also
//! hosts the shared `metrics.k8s.io` plumbing `cpu` reuses.

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::{Api, Client};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

/// Which resource a `PodMetrics` container entry is read for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// CPU, reported in millicores (`"100m"`).
    Cpu,
    /// Memory, reported in bytes with a binary suffix (`"128Mi"`).
    Memory,
}

struct MemoryScaler {
    metric_name: String,
    metric_type: MetricType,
    namespace: String,
    label_selector: String,
    target_utilization: f64,
    activation_threshold: f64,
    client: Client,
}

#[async_trait]
impl Scaler for MemoryScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec { name: self.metric_name.clone(), metric_type: self.metric_type, target_value: self.target_utilization }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let utilization = resource_scaler_metrics(&self.client, &self.namespace, &self.label_selector, ResourceKind::Memory).await?;
        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value: utilization }],
            active: utilization > self.activation_threshold,
        })
    }
}

/// Build a `memory` scaler from its trigger declaration.
///
/// # Errors
/// Returns [`BuildError`] if `namespace` or `podSelector` is missing.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    _auth: &ResolvedAuth,
    global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let namespace = require(trigger, "namespace")?.to_string();
    let label_selector = require(trigger, "podSelector")?.to_string();
    let target_utilization: f64 = optional_parsed(trigger, "targetValue", 80.0)?;
    let activation_threshold: f64 = optional_parsed(trigger, "activationTargetValue", 0.0)?;

    Ok(Arc::new(MemoryScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::Utilization),
        namespace,
        label_selector,
        target_utilization,
        activation_threshold,
        client: global.kube.clone(),
    }))
}

/// Fetch `PodMetrics` matching `label_selector` and average the requested
/// resource's usage-to-request ratio, expressed as a percentage.
///
/// `metrics.k8s.io` isn't covered by `k8s-openapi`'s generated types (it's
/// an aggregated API, not part of the core API surface), so this reads it
/// as a [`DynamicObject`] through a manually-declared [`ApiResource`].
pub(crate) async fn resource_scaler_metrics(
    client: &Client,
    namespace: &str,
    label_selector: &str,
    kind: ResourceKind,
) -> Result<f64, PollError> {
    let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
    let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, &resource);

    let params = kube::api::ListParams::default().labels(label_selector);
    let list = api.list(&params).await?;

    let mut total_ratio = 0.0;
    let mut samples = 0usize;

    for pod in &list.items {
        let Some(containers) = pod.data.get("containers").and_then(|c| c.as_array()) else { continue };
        for container in containers {
            let usage = container.get("usage");
            let (raw_used, raw_request_key) = match kind {
                ResourceKind::Cpu => (usage.and_then(|u| u.get("cpu")), "cpu"),
                ResourceKind::Memory => (usage.and_then(|u| u.get("memory")), "memory"),
            };
            let Some(used) = raw_used.and_then(|v| v.as_str()).and_then(parse_quantity) else { continue };
            let request = container
                .get("requests")
                .and_then(|r| r.get(raw_request_key))
                .and_then(|v| v.as_str())
                .and_then(parse_quantity)
                .unwrap_or(used.max(1.0));
            total_ratio += (used / request) * 100.0;
            samples += 1;
        }
    }

    if samples == 0 {
        return Err(PollError::BadResponse(format!("no pods matched selector {label_selector:?}")));
    }

    Ok(total_ratio / samples as f64)
}

/// Parse a Kubernetes resource quantity string (`"100m"`, `"128Mi"`,
/// `"1"`) into a plain float in its base unit (millicores or bytes).
fn parse_quantity(raw: &str) -> Option<f64> {
    if let Some(stripped) = raw.strip_suffix('m') {
        return stripped.parse().ok();
    }
    let suffixes: &[(&str, f64)] = &[
        ("Ki", 1024.0),
        ("Mi", 1024.0f64.powi(2)),
        ("Gi", 1024.0f64.powi(3)),
        ("Ti", 1024.0f64.powi(4)),
        ("k", 1000.0),
        ("M", 1000.0f64.powi(2)),
        ("G", 1000.0f64.powi(3)),
    ];
    for (suffix, multiplier) in suffixes {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            return stripped.parse::<f64>().ok().map(|v| v * multiplier);
        }
    }
    raw.parse::<f64>().ok().map(|cores| cores * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_millicore_quantities() {
        assert_eq!(parse_quantity("250m"), Some(250.0));
    }

    #[test]
    fn parses_binary_memory_quantities() {
        assert_eq!(parse_quantity("128Mi"), Some(128.0 * 1024.0 * 1024.0));
    }

    #[test]
    fn parses_bare_core_count_as_millicores() {
        assert_eq!(parse_quantity("2"), Some(2000.0));
    }
}
