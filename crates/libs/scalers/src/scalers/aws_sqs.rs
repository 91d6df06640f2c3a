//! `aws-sqs-queue` trigger — approximate visible message count on an SQS
//! queue (spec.md §4.2 "Queue-depth scalers").

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, require_parsed, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

use super::queue_depth::{HttpQueueDepthProvider, QueueDepthProvider};

struct AwsSqsScaler {
    metric_name: String,
    metric_type: MetricType,
    queue_length_threshold: f64,
    activation_threshold: f64,
    provider: Arc<dyn QueueDepthProvider>,
}

#[async_trait]
impl Scaler for AwsSqsScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec {
            name: self.metric_name.clone(),
            metric_type: self.metric_type,
            target_value: self.queue_length_threshold,
        }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let depth = self.provider.queue_depth().await?;
        let value = depth.length as f64;
        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value }],
            active: value > self.activation_threshold,
        })
    }
}

/// Build an `aws-sqs-queue` scaler from its trigger declaration. Either a
/// static access key pair (via `TriggerAuthentication`) or pod identity
/// (IAM role for service accounts / instance profile) authenticates the
/// underlying endpoint; this crate treats both the same way, since the
/// actual AWS SDK call is out of scope (see
/// `crate::scalers::queue_depth`).
///
/// # Errors
/// Returns [`BuildError`] if `queueLength` or `queueDepthEndpoint` is
/// missing or malformed, or if pod identity is requested for a provider
/// other than `aws-eks`.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    auth: &ResolvedAuth,
    global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let endpoint = require(trigger, "queueDepthEndpoint")?.to_string();
    let threshold: f64 = require_parsed(trigger, "queueLength")?;
    let activation_threshold: f64 = optional_parsed(trigger, "activationQueueLength", 0.0)?;

    if let Some(identity) = &auth.pod_identity {
        if identity.provider != "aws-eks" {
            return Err(BuildError::InconsistentOptions {
                scaler_type: trigger.type_.clone(),
                reason: format!("pod identity provider {:?} is not valid for aws-sqs-queue", identity.provider),
            });
        }
    }

    let mut headers = Vec::new();
    if let Some(key) = auth.secrets.get("awsAccessKeyId") {
        headers.push(("X-Amz-Access-Key-Id".to_string(), key.clone()));
    }

    Ok(Arc::new(AwsSqsScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        queue_length_threshold: threshold,
        activation_threshold,
        provider: Arc::new(HttpQueueDepthProvider::new(global.http.clone(), endpoint, headers)),
    }))
}
