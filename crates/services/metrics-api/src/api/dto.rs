//! Wire shapes for the external-metrics API and this adapter's own
//! observability routes (spec.md §6 "Metrics endpoint").

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query parameters accepted alongside the `{namespace}/{metricName}` path
/// segments.
#[derive(Debug, Deserialize)]
pub struct MetricQuery {
    /// Label selector, e.g. `scaledObjectName=checkout-worker`. The cluster
    /// autoscaler always supplies this to disambiguate which target's
    /// trigger a bare metric name belongs to.
    #[serde(default, rename = "labelSelector")]
    pub label_selector: String,
}

/// One `metricName=value` pair in the label selector's `k=v,k=v` syntax.
#[must_use]
pub fn parse_label_selector(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// A single sample in the response body, shaped after the cluster-standard
/// `external.metrics.k8s.io/v1beta1.ExternalMetricValue`.
#[derive(Debug, Serialize)]
pub struct ExternalMetricValue {
    /// The metric name being reported.
    #[serde(rename = "metricName")]
    pub metric_name: String,
    /// Labels identifying the resource the value applies to.
    #[serde(rename = "metricLabels")]
    pub metric_labels: BTreeMap<String, String>,
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// The observed value.
    pub value: f64,
}

/// `ExternalMetricValueList`, the response body's top level.
#[derive(Debug, Serialize)]
pub struct ExternalMetricValueList {
    /// Always `"external.metrics.k8s.io/v1beta1"`.
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// Always `"ExternalMetricValueList"`.
    pub kind: String,
    /// The samples matching the request.
    pub items: Vec<ExternalMetricValue>,
}

impl ExternalMetricValueList {
    /// Wrap a single value, the common case for this adapter (one
    /// `{target, trigger}` pair per request).
    #[must_use]
    pub fn single(metric_name: String, namespace: &str, scaled_object_name: &str, value: f64) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("namespace".to_string(), namespace.to_string());
        labels.insert("scaledObjectName".to_string(), scaled_object_name.to_string());
        Self {
            api_version: "external.metrics.k8s.io/v1beta1".to_string(),
            kind: "ExternalMetricValueList".to_string(),
            items: vec![ExternalMetricValue { metric_name, metric_labels: labels, timestamp: Utc::now(), value }],
        }
    }
}

/// Liveness response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status, always `"healthy"` when this handler runs at all.
    pub status: String,
    /// Service name, for log correlation.
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pairs() {
        let labels = parse_label_selector("scaledObjectName=checkout-worker,env=prod");
        assert_eq!(labels.get("scaledObjectName").map(String::as_str), Some("checkout-worker"));
        assert_eq!(labels.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn ignores_malformed_pairs() {
        let labels = parse_label_selector("noequalssign,scaledObjectName=foo");
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("scaledObjectName").map(String::as_str), Some("foo"));
    }

    #[test]
    fn single_wraps_one_item_with_expected_labels() {
        let list = ExternalMetricValueList::single("kafka".to_string(), "ns", "checkout-worker", 8.0);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].metric_name, "kafka");
        assert_eq!(list.items[0].value, 8.0);
        assert_eq!(list.items[0].metric_labels.get("scaledObjectName").map(String::as_str), Some("checkout-worker"));
    }
}
