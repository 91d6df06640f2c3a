//! `kafka` trigger — consumer-group lag against a partitioned topic
//! (spec.md §4.2 "Queue-depth scalers").

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, require_parsed, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

use super::queue_depth::{HttpQueueDepthProvider, QueueDepthProvider};

struct KafkaScaler {
    metric_name: String,
    metric_type: MetricType,
    lag_threshold: f64,
    activation_lag_threshold: f64,
    /// Also counting in-flight/unacked messages, when configured
    /// (spec.md §4.2: "some... additionally count in-flight / unacked
    /// messages when so configured").
    include_in_flight: bool,
    provider: Arc<dyn QueueDepthProvider>,
}

#[async_trait]
impl Scaler for KafkaScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec {
            name: self.metric_name.clone(),
            metric_type: self.metric_type,
            target_value: self.lag_threshold,
        }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let depth = self.provider.queue_depth().await?;
        let lag = if self.include_in_flight {
            depth.length + depth.in_flight.unwrap_or(0)
        } else {
            depth.length
        };

        let raw_lag = lag as f64;
        let value = super::queue_depth::clamp_to_partitions(lag, self.lag_threshold, depth.partitions);

        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value }],
            // Activity is a function of the raw, unclamped lag (spec.md
            // §4.2: "active=true iff length > activationThreshold"); the
            // partition cap only bounds the value used for scaling math.
            active: raw_lag > self.activation_lag_threshold,
        })
    }
}

/// Build a `kafka` scaler from its trigger declaration.
///
/// # Errors
/// Returns [`BuildError`] if `lagThreshold` or `queueDepthEndpoint` is
/// missing or malformed.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    auth: &ResolvedAuth,
    global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let endpoint = require(trigger, "queueDepthEndpoint")?.to_string();
    let lag_threshold: f64 = require_parsed(trigger, "lagThreshold")?;
    let activation_lag_threshold: f64 = optional_parsed(trigger, "activationLagThreshold", 0.0)?;
    let include_in_flight: bool = optional_parsed(trigger, "includeInFlight", false)?;

    let mut headers = Vec::new();
    if let Some(token) = auth.secrets.get("bootstrapAuthToken") {
        headers.push(("Authorization".to_string(), format!("Bearer {token}")));
    }

    Ok(Arc::new(KafkaScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        lag_threshold,
        activation_lag_threshold,
        include_in_flight,
        provider: Arc::new(HttpQueueDepthProvider::new(global.http.clone(), endpoint, headers)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::queue_depth::QueueDepth;

    struct FixedProvider(QueueDepth);

    #[async_trait]
    impl QueueDepthProvider for FixedProvider {
        async fn queue_depth(&self) -> Result<QueueDepth, PollError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn activity_uses_raw_lag_not_the_partition_clamped_value() {
        // S5: 3 partitions, lag threshold 10, raw lag 50 -> clamped value
        // is 30, well under an activation threshold of 40, but the raw lag
        // of 50 still crosses it.
        let scaler = KafkaScaler {
            metric_name: "kafka".to_string(),
            metric_type: MetricType::AverageValue,
            lag_threshold: 10.0,
            activation_lag_threshold: 40.0,
            include_in_flight: false,
            provider: Arc::new(FixedProvider(QueueDepth { length: 50, partitions: Some(3), in_flight: None })),
        };

        let result = scaler.get_metrics_and_activity().await.unwrap();
        assert_eq!(result.samples[0].value, 30.0);
        assert!(result.active);
    }

    #[tokio::test]
    async fn inactive_below_raw_activation_threshold() {
        let scaler = KafkaScaler {
            metric_name: "kafka".to_string(),
            metric_type: MetricType::AverageValue,
            lag_threshold: 10.0,
            activation_lag_threshold: 40.0,
            include_in_flight: false,
            provider: Arc::new(FixedProvider(QueueDepth { length: 20, partitions: None, in_flight: None })),
        };

        let result = scaler.get_metrics_and_activity().await.unwrap();
        assert!(!result.active);
    }
}
