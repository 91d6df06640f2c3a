//! HTTP request handlers for the external-metrics adapter (spec.md §4.3).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use prometheus::{Encoder, TextEncoder};
use tracing::warn;

use engine_core::ScalingTarget;
use engine_scalers::auth::HttpExternalSecretStore;
use engine_scalers::{build_entry, poll_target, TargetKey};
use kube::api::Api;
use kube::ResourceExt;

use crate::api::dto::{parse_label_selector, ExternalMetricValueList, HealthResponse, MetricQuery};
use crate::error::{ApiError, Result};
use crate::state::AppState;

const PAUSED_REPLICAS_ANNOTATION: &str = "eventscale.example.io/paused-replicas";
const PAUSED_ANNOTATION: &str = "eventscale.example.io/paused";

/// Liveness endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy".to_string(), service: "engine-metrics-api".to_string() })
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = state.prometheus_registry.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return (axum::http::StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (axum::http::StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
}

/// `GET /apis/external.metrics.../namespaces/{namespace}/{metric_name}`.
///
/// Looks up the owning `ScalingTarget` from the `scaledObjectName` carried
/// in `labelSelector`, consults the in-memory last-known value from the
/// scaler runtime (forcing a fresh poll unless the owning trigger sets
/// `useCachedMetrics`), applies the paused-target override, and returns the
/// sample the autoscaler should read (spec.md §4.3).
///
/// # Errors
/// Returns [`ApiError`] per the external-metrics contract: a missing
/// `scaledObjectName`, an unknown target, an unregistered metric name, or a
/// fully-exhausted fallback with no policy configured.
pub async fn external_metric(
    State(state): State<AppState>,
    Path((namespace, metric_name)): Path<(String, String)>,
    Query(query): Query<MetricQuery>,
) -> Result<Json<ExternalMetricValueList>> {
    let labels = parse_label_selector(&query.label_selector);
    let scaled_object_name = labels.get("scaledObjectName").ok_or(ApiError::MissingScaledObjectName)?;

    let api: Api<ScalingTarget> = Api::namespaced(state.client.clone(), &namespace);
    let target = api.get(scaled_object_name).await.map_err(|err| match err {
        kube::Error::Api(e) if e.code == 404 => ApiError::TargetNotFound,
        other => ApiError::Kube(other),
    })?;

    if let Some(paused) = target.annotations().get(PAUSED_REPLICAS_ANNOTATION).and_then(|v| v.parse::<i32>().ok()) {
        return Ok(Json(ExternalMetricValueList::single(metric_name, &namespace, scaled_object_name, f64::from(paused))));
    }
    if target.annotations().get(PAUSED_ANNOTATION).is_some_and(|v| v == "true") {
        let frozen = current_replicas(&state, &namespace, &target).await;
        return Ok(Json(ExternalMetricValueList::single(metric_name, &namespace, scaled_object_name, f64::from(frozen))));
    }

    let key = TargetKey::scaling_target(&namespace, scaled_object_name);
    let entry = rebuild_if_stale(&state, &namespace, &target, &key).await?;

    // `scalingModifiers` replaces every per-trigger metric the autoscaler
    // sees with one composite metric (spec.md §4.2); the only valid name
    // to query for is the composite's.
    if let Some(modifiers) = target.spec.scaling_modifiers.as_ref() {
        if modifiers.metric_name != metric_name {
            return Err(ApiError::MetricNotFound);
        }
        let current_replicas = current_replicas(&state, &namespace, &target).await;
        let poll = poll_target(&entry, target.spec.fallback.as_ref(), current_replicas, std::time::Duration::from_secs(state.config.poll_timeout_secs), Some(modifiers)).await;
        let Some(value) = poll.samples.iter().find(|s| s.name == metric_name).map(|s| s.value) else {
            return Err(ApiError::MetricNotFound);
        };
        return Ok(Json(ExternalMetricValueList::single(metric_name, &namespace, scaled_object_name, value)));
    }

    let Some(built) = entry.scalers.iter().find(|b| b.metric_name == metric_name) else {
        return Err(ApiError::MetricNotFound);
    };

    let value = if built.trigger.use_cached_metrics {
        entry.last_known.lock().expect("last-known lock poisoned").get(&metric_name).map(|(value, _)| *value)
    } else {
        let current_replicas = current_replicas(&state, &namespace, &target).await;
        let poll = poll_target(&entry, target.spec.fallback.as_ref(), current_replicas, std::time::Duration::from_secs(state.config.poll_timeout_secs), None).await;
        if poll.samples.is_empty() && target.spec.fallback.is_none() && !entry.scalers.is_empty() {
            return Err(ApiError::FallbackExhausted);
        }
        poll.samples.iter().find(|s| s.name == metric_name).map(|s| s.value)
    };

    let Some(value) = value else {
        return Err(ApiError::MetricNotFound);
    };

    Ok(Json(ExternalMetricValueList::single(metric_name, &namespace, scaled_object_name, value)))
}

/// Resolve authentication and rebuild the cache entry for `key`, publishing
/// it only if the fingerprint actually changed (preserving the existing
/// entry's failure trackers and last-known values across requests that see
/// no configuration change — spec.md §8 "Fingerprint stability").
async fn rebuild_if_stale(state: &AppState, namespace: &str, target: &ScalingTarget, key: &TargetKey) -> Result<Arc<engine_scalers::CacheEntry>> {
    let store = HttpExternalSecretStore::new(state.global.http.clone());
    let outcome = build_entry(&state.client, namespace, target.metadata.generation.unwrap_or(0), &target.spec.triggers, &state.global, &store, &state.registry).await;
    for failure in &outcome.failures {
        warn!(trigger_index = failure.trigger_index, error = %failure.error, "scaler construction failed while serving a metrics request");
    }

    if !state.scalers.is_current(key, &outcome.entry.fingerprint) {
        state.scalers.publish(key.clone(), outcome.entry);
    }
    state.scalers.get(key).ok_or(ApiError::MetricNotFound)
}

async fn current_replicas(state: &AppState, namespace: &str, target: &ScalingTarget) -> i32 {
    use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
    let reference = &target.spec.scale_target_ref;
    let result = match reference.kind.as_str() {
        "Deployment" => Api::<Deployment>::namespaced(state.client.clone(), namespace).get_scale(&reference.name).await.map(|s| s.spec.and_then(|s| s.replicas)),
        "StatefulSet" => Api::<StatefulSet>::namespaced(state.client.clone(), namespace).get_scale(&reference.name).await.map(|s| s.spec.and_then(|s| s.replicas)),
        "ReplicaSet" => Api::<ReplicaSet>::namespaced(state.client.clone(), namespace).get_scale(&reference.name).await.map(|s| s.spec.and_then(|s| s.replicas)),
        _ => Ok(None),
    };
    result.ok().flatten().unwrap_or(0)
}
