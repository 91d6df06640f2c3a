//! `EventSink` / `ClusterEventSink` reconciliation (spec.md §3.1, §6).
//!
//! Probes each destination's reachability and republishes
//! `status.destinations`. No finalizer: a sink carries no owned cluster
//! objects, only a name the event emitter's delivery path looks up by
//! reference.

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;

use engine_core::{ClusterEventSink, DestinationStatus, EventDestination, EventSink, EventSinkStatus};

use crate::context::Context;
use crate::error::Result;

const FIELD_MANAGER: &str = "eventscale-controller";
const REQUEUE_INTERVAL: Duration = Duration::from_secs(60);

async fn probe(http: &reqwest::Client, destination: &EventDestination) -> bool {
    match destination {
        EventDestination::Http { url } => http.head(url).send().await.is_ok(),
        // No generic reachability probe for an opaque bus endpoint; treat
        // configured destinations as active until a delivery actually fails.
        EventDestination::CloudEventBus { .. } => true,
    }
}

async fn probe_all(http: &reqwest::Client, destinations: &[EventDestination]) -> Vec<DestinationStatus> {
    let mut out = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let active = probe(http, destination).await;
        out.push(DestinationStatus { destination: destination.label(), active });
    }
    out
}

/// Reconcile one namespaced `EventSink`.
///
/// # Errors
/// Returns [`crate::error::ControllerError`] on a Kubernetes API failure.
pub async fn reconcile(sink: Arc<EventSink>, ctx: Arc<Context>) -> Result<Action> {
    let Some(namespace) = sink.namespace() else { return Ok(Action::await_change()) };
    let name = sink.name_any();

    let destinations = probe_all(&ctx.global.http, &sink.spec.destinations).await;
    let api: Api<EventSink> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = serde_json::json!({ "status": EventSinkStatus { destinations } });
    api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;

    Ok(Action::requeue(REQUEUE_INTERVAL))
}

/// Reconcile one cluster-scoped `ClusterEventSink`.
///
/// # Errors
/// Returns [`crate::error::ControllerError`] on a Kubernetes API failure.
pub async fn reconcile_cluster(sink: Arc<ClusterEventSink>, ctx: Arc<Context>) -> Result<Action> {
    let name = sink.name_any();

    let destinations = probe_all(&ctx.global.http, &sink.spec.destinations).await;
    let api: Api<ClusterEventSink> = Api::all(ctx.client.clone());
    let patch = serde_json::json!({ "status": EventSinkStatus { destinations } });
    api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;

    Ok(Action::requeue(REQUEUE_INTERVAL))
}
