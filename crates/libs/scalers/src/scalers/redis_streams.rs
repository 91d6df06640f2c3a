//! `redis-streams` trigger — pending-entries count for a consumer group on
//! a Redis stream (spec.md §4.2 "Queue-depth scalers").

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, require_parsed, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

use super::queue_depth::{HttpQueueDepthProvider, QueueDepthProvider};

struct RedisStreamsScaler {
    metric_name: String,
    metric_type: MetricType,
    pending_entries_threshold: f64,
    activation_threshold: f64,
    provider: Arc<dyn QueueDepthProvider>,
}

#[async_trait]
impl Scaler for RedisStreamsScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec {
            name: self.metric_name.clone(),
            metric_type: self.metric_type,
            target_value: self.pending_entries_threshold,
        }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let depth = self.provider.queue_depth().await?;
        // Redis streams are not partition-sharded the way Kafka topics
        // are; `depth.partitions` is ignored even if the endpoint reports
        // one.
        let value = depth.length as f64;
        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value }],
            active: value > self.activation_threshold,
        })
    }
}

/// Build a `redis-streams` scaler from its trigger declaration.
///
/// # Errors
/// Returns [`BuildError`] if `pendingEntriesCountThreshold` or
/// `queueDepthEndpoint` is missing or malformed.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    auth: &ResolvedAuth,
    global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let endpoint = require(trigger, "queueDepthEndpoint")?.to_string();
    let threshold: f64 = require_parsed(trigger, "pendingEntriesCountThreshold")?;
    let activation_threshold: f64 = optional_parsed(trigger, "activationPendingEntriesCountThreshold", 0.0)?;

    let mut headers = Vec::new();
    if let Some(password) = auth.secrets.get("password") {
        headers.push(("Authorization".to_string(), format!("Bearer {password}")));
    }

    Ok(Arc::new(RedisStreamsScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        pending_entries_threshold: threshold,
        activation_threshold,
        provider: Arc::new(HttpQueueDepthProvider::new(global.http.clone(), endpoint, headers)),
    }))
}
