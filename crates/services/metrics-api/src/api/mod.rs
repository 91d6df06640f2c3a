//! HTTP surface for the external-metrics adapter.

pub mod dto;
pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the adapter's router: the external-metrics route plus the shared
/// `/metrics` and `/healthz` observability routes (spec.md §4.3, §6).
#[must_use]
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/apis/external.metrics.k8s.io/v1beta1/namespaces/{namespace}/{metric_name}", get(handlers::external_metric))
        .with_state(state)
}
