//! Lifecycle event emission against configured `EventSink`/`ClusterEventSink`
//! destinations (spec.md §6 "Event emission").
//!
//! A target has no explicit reference to a sink; every namespaced
//! `EventSink` in the target's namespace plus every `ClusterEventSink`
//! receives every lifecycle event this process emits, mirroring the way
//! the companion metrics are broadcast rather than addressed.

use engine_core::crds::EventDestination;
use engine_events::{build_event, EventContext, EventKind};
use kube::api::Api;
use serde::Serialize;
use tracing::warn;

use crate::context::Context;

/// Build the envelope for `(kind, namespace, resource_kind, name)` carrying
/// `payload`, resolve this process's configured sinks, and enqueue one
/// delivery per destination. Best-effort: sink listing or envelope
/// construction failures are logged and otherwise ignored, since a failed
/// emission must never block reconciliation (spec.md §7 treats event
/// delivery failures as an observability concern, not a reconcile error).
pub async fn emit<T: Serialize>(ctx: &Context, namespace: &str, resource_kind: &str, name: &str, kind: EventKind, payload: &T) {
    let context = EventContext {
        cluster_name: ctx.config.cluster_name.clone(),
        namespace: namespace.to_string(),
        kind: resource_kind.to_string(),
        name: name.to_string(),
    };
    let event = match build_event(kind, &context, payload) {
        Ok(event) => event,
        Err(error) => {
            warn!(%error, "failed to build lifecycle event envelope");
            return;
        }
    };

    for destination in resolve_destinations(ctx, namespace).await {
        ctx.events.enqueue(namespace, destination, event.clone(), &ctx.event_metrics).await;
    }
}

async fn resolve_destinations(ctx: &Context, namespace: &str) -> Vec<EventDestination> {
    let mut destinations = Vec::new();

    let namespaced: Api<engine_core::EventSink> = Api::namespaced(ctx.client.clone(), namespace);
    match namespaced.list(&Default::default()).await {
        Ok(list) => destinations.extend(list.into_iter().flat_map(|sink| sink.spec.destinations)),
        Err(error) => warn!(%error, %namespace, "failed to list EventSink destinations"),
    }

    let cluster: Api<engine_core::ClusterEventSink> = Api::all(ctx.client.clone());
    match cluster.list(&Default::default()).await {
        Ok(list) => destinations.extend(list.into_iter().flat_map(|sink| sink.spec.destinations)),
        Err(error) => warn!(%error, "failed to list ClusterEventSink destinations"),
    }

    destinations
}
