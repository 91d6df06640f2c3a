//! `prometheus` trigger — issue a PromQL query, parse the scalar result
//! (spec.md §4.2 "Metric-query scalers").

use std::sync::Arc;

use async_trait::async_trait;
use engine_core::{MetricType, Trigger};
use serde::Deserialize;

use crate::auth::ResolvedAuth;
use crate::error::{BuildError, PollError};
use crate::registry::{optional_parsed, require, require_parsed, GlobalConfig};
use crate::scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};

struct PrometheusScaler {
    metric_name: String,
    metric_type: MetricType,
    server_address: String,
    query: String,
    threshold: f64,
    activation_threshold: f64,
    ignore_null_values: bool,
    client: reqwest::Client,
    bearer_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromResponse {
    data: PromData,
}

#[derive(Debug, Deserialize)]
struct PromData {
    result: Vec<PromResult>,
}

#[derive(Debug, Deserialize)]
struct PromResult {
    /// `[timestamp, value]`, value is a JSON string per Prometheus's own
    /// wire format.
    value: Option<(f64, String)>,
}

#[async_trait]
impl Scaler for PrometheusScaler {
    fn metric_spec(&self) -> Vec<MetricSpec> {
        vec![MetricSpec { name: self.metric_name.clone(), metric_type: self.metric_type, target_value: self.threshold }]
    }

    async fn get_metrics_and_activity(&self) -> Result<MetricsAndActivity, PollError> {
        let url = format!("{}/api/v1/query", self.server_address.trim_end_matches('/'));
        let mut req = self.client.get(&url).query(&[("query", self.query.as_str())]);
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?.error_for_status()?.json::<PromResponse>().await?;

        let scalar = match response.data.result.first().and_then(|r| r.value.as_ref()) {
            Some((_, raw)) => raw.parse::<f64>().map_err(|_| PollError::BadResponse(format!("non-numeric scalar {raw:?}")))?,
            None => {
                if self.ignore_null_values {
                    0.0
                } else {
                    return Err(PollError::BadResponse("query returned no series and ignoreNullValues=false".to_string()));
                }
            }
        };

        Ok(MetricsAndActivity {
            samples: vec![Sample { name: self.metric_name.clone(), value: scalar }],
            active: scalar > self.activation_threshold,
        })
    }
}

/// Build a `prometheus` scaler from its trigger declaration.
///
/// # Errors
/// Returns [`BuildError`] if `serverAddress`, `query`, or `threshold` is
/// missing or malformed.
pub fn build(
    trigger: &Trigger,
    metric_name: &str,
    auth: &ResolvedAuth,
    global: &GlobalConfig,
) -> Result<Arc<dyn Scaler>, BuildError> {
    let server_address = require(trigger, "serverAddress")?.to_string();
    let query = require(trigger, "query")?.to_string();
    let threshold: f64 = require_parsed(trigger, "threshold")?;
    let activation_threshold: f64 = optional_parsed(trigger, "activationThreshold", 0.0)?;
    let ignore_null_values: bool = optional_parsed(trigger, "ignoreNullValues", true)?;

    Ok(Arc::new(PrometheusScaler {
        metric_name: metric_name.to_string(),
        metric_type: trigger.metric_type.unwrap_or(MetricType::AverageValue),
        server_address,
        query,
        threshold,
        activation_threshold,
        ignore_null_values,
        client: global.http.clone(),
        bearer_token: auth.secrets.get("bearerToken").cloned(),
    }))
}
