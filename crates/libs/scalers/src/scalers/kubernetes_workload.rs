//! `kubernetes-workload` trigger — scale off the count of pods matching a
//! label selector, typically a different workload than the one being
//! scaled (e.g. scale a processor fleet off a producer fleet's pod count).

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, Client};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

struct KubernetesWorkloadScaler {
    metric_name: String,
    metric_type: MetricType,
    namespace: String,
    label_selector: String,
    value: f64,
    activation_threshold: f64,
    client: Client,
}

#[async_trait]
impl Scaler for KubernetesWorkloadScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec { name: self.metric_name.clone(), metric_type: self.metric_type, target_value: self.value }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let params = ListParams::default().labels(&self.label_selector);
        let pods = api.list(&params).await?;

        let running = pods
            .iter()
            .filter(|pod| pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running"))
            .count();

        let count = running as f64;
        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value: count }],
            active: count > self.activation_threshold,
        })
    }
}

/// Build a `kubernetes-workload` scaler from its trigger declaration.
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
    let value: f64 = optional_parsed(trigger, "value", 1.0)?;
    let activation_threshold: f64 = optional_parsed(trigger, "activationValue", 0.0)?;

    Ok(Arc::new(KubernetesWorkloadScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        namespace,
        label_selector,
        value,
        activation_threshold,
        client: global.kube.clone(),
    }))
}
