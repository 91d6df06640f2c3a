//! Shared plumbing for the queue-depth scaler family (spec.md §4.2
//! "Queue-depth scalers": kafka, redis-streams, aws-sqs-queue).
//!
//! The concrete message-broker and cloud-queue wire protocols are out of
//! scope for this crate (spec.md §1 lists "specific protocol drivers for
//! message brokers, databases, and cloud APIs" as external collaborators,
//! "plugged in via a uniform interface"). Each queue-depth trigger type
//! therefore reads its current length from a configured HTTP endpoint
//! returning a small JSON shape, rather than embedding a broker-specific
//! client SDK. A production deployment points `queueDepthEndpoint` at a
//! sidecar or exporter that speaks the real protocol.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PollError;

/// The length/partition shape every queue-depth endpoint returns.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueDepth {
    /// Current queue/lag length.
    pub length: i64,
    /// Partition count, when the underlying system is partitioned
    /// (e.g. a Kafka topic). `None` for non-partitioned queues (SQS).
    #[serde(default)]
    pub partitions: Option<i32>,
    /// Messages read but not yet committed/acked, when the endpoint tracks
    /// them separately from `length` (spec.md §4.2: "some... additionally
    /// count in-flight / unacked messages when so configured").
    #[serde(default)]
    pub in_flight: Option<i64>,
}

/// Reads [`QueueDepth`] from a configured HTTP endpoint.
#[async_trait]
pub trait QueueDepthProvider: Send + Sync {
    /// Fetch the current queue depth.
    async fn queue_depth(&self) -> Result<QueueDepth, PollError>;
}

/// The default HTTP-polling provider.
pub struct HttpQueueDepthProvider {
    client: reqwest::Client,
    endpoint: String,
    headers: Vec<(String, String)>,
}

impl HttpQueueDepthProvider {
    /// Build a provider against `endpoint`, authenticating with `headers`
    /// (typically a bearer token resolved from a `TriggerAuthentication`).
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: String, headers: Vec<(String, String)>) -> Self {
        Self { client, endpoint, headers }
    }
}

#[async_trait]
impl QueueDepthProvider for HttpQueueDepthProvider {
    async fn queue_depth(&self) -> Result<QueueDepth, PollError> {
        let mut req = self.client.get(&self.endpoint);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        let depth = req.send().await?.error_for_status()?.json::<QueueDepth>().await?;
        Ok(depth)
    }
}

/// Clamp the published metric value so that, once divided by
/// `target_per_replica`, it never implies more consumers than there are
/// partitions (spec.md §4.2: "the returned value, when multiplied by the
/// configured number of target replicas, MUST NOT exceed the partition
/// count"; spec.md §8 scenario S5).
#[must_use]
pub fn clamp_to_partitions(length: i64, target_per_replica: f64, partitions: Option<i32>) -> f64 {
    let raw = length as f64;
    let Some(partitions) = partitions else {
        return raw;
    };
    if target_per_replica <= 0.0 {
        return raw;
    }
    let desired_replicas = raw / target_per_replica;
    let capped_replicas = desired_replicas.min(f64::from(partitions));
    capped_replicas * target_per_replica
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_s5_partition_clamp() {
        // 3 partitions, lag threshold 10, current lag 50: raw need is
        // lag/threshold = 5, clamped to 3 (one consumer per partition).
        let clamped_value = clamp_to_partitions(50, 10.0, Some(3));
        assert_eq!(clamped_value / 10.0, 3.0);
    }

    #[test]
    fn unpartitioned_queue_is_not_clamped() {
        assert_eq!(clamp_to_partitions(500, 10.0, None), 500.0);
    }
}
