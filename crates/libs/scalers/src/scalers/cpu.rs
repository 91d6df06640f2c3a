//! `cpu` trigger — average CPU utilization across the scaled workload's
//! pods, read from the cluster's resource-metrics API.

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};
use kube::Client;

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

use super::memory::{resource_scaler_metrics, ResourceKind};

struct CpuScaler {
    metric_name: String,
    metric_type: MetricType,
    namespace: String,
    label_selector: String,
    target_utilization: f64,
    activation_threshold: f64,
    client: Client,
}

#[async_trait]
impl Scaler for CpuScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec { name: self.metric_name.clone(), metric_type: self.metric_type, target_value: self.target_utilization }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let utilization = resource_scaler_metrics(&self.client, &self.namespace, &self.label_selector, ResourceKind::Cpu).await?;
        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value: utilization }],
            active: utilization > self.activation_threshold,
        })
    }
}

/// Build a `cpu` scaler from its trigger declaration.
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

    Ok(Arc::new(CpuScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::Utilization),
        namespace,
        label_selector,
        target_utilization,
        activation_threshold,
        client: global.kube.clone(),
    }))
}
