//! The controller process's own observability surface: `/metrics`
//! (Prometheus text exposition) and `/healthz` (liveness), served
//! alongside the reconciliation loops (spec.md §6).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::info;

use crate::context::Context;

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(registry): State<Arc<Registry>>) -> (StatusCode, String) {
    let encoder = TextEncoder::new();
    let families = registry.gather();
    let mut buffer = Vec::new();
    if encoder.encode(&families, &mut buffer).is_err() {
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }
    (StatusCode::OK, String::from_utf8_lossy(&buffer).into_owned())
}

/// Serve `/metrics` and `/healthz` on `ctx.config.listen_addr` until the
/// process is signalled to stop.
pub async fn serve(ctx: Arc<Context>) {
    let registry = Arc::clone(&ctx.prometheus_registry);
    let app = Router::new().route("/healthz", get(healthz)).route("/metrics", get(metrics)).with_state(registry);

    info!(addr = %ctx.config.listen_addr, "serving /metrics and /healthz");
    let listener = match tokio::net::TcpListener::bind(&ctx.config.listen_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(error = %err, "failed to bind observability listener");
            return;
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "observability server exited");
    }
}
