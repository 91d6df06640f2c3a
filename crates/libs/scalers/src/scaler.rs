//! The uniform scaler capability set (spec.md §4.2).
//!
//! Every trigger type, once built, is exposed to the rest of the runtime
//! through this one trait. Implementations must be stateless across polls
//! unless they explicitly own a connection pool or change-feed cursor.

use async_trait::async_trait;
use engine_core::MetricType;

use crate::error::PollError;

/// One metric identifier and target this scaler exposes to the companion
/// autoscaler, returned by [`Scaler::metric_spec`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    /// Published metric name, already disambiguated (see
    /// `engine_core::trigger::disambiguate_metric_names`).
    pub name: String,
    /// How the value relates to the replica count.
    pub metric_type: MetricType,
    /// The threshold the autoscaler targets.
    pub target_value: f64,
}

/// A single `(name, value)` sample returned from a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Metric name this sample belongs to.
    pub name: String,
    /// The observed value.
    pub value: f64,
}

/// The result of one `get_metrics_and_activity` call.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsAndActivity {
    /// Samples produced by this poll, one per metric this scaler exposes.
    pub samples: Vec<Sample>,
    /// Whether this trigger currently counts as active (spec.md §4.1).
    pub active: bool,
}

/// The live instance built from a `{trigger, authentication}` pair.
///
/// `close` is called exactly once, guaranteed before the instance is
/// discarded, to release any owned connections.
#[async_trait]
pub trait Scaler: Send + Sync {
    /// Return the list of metric identifiers and targets this scaler
    /// exposes. Idempotent; no I/O.
    fn metric_spec(&self) -> Vec<MetricSpec>;

    /// Poll the external signal once. May suspend on I/O; callers are
    /// expected to bound this with a timeout (see `crate::poll`).
    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError>;

    /// Release connections. A no-op default suits scalers with no pooled
    /// resources (e.g. the cron scaler).
    async fn close(&self) {}
}
