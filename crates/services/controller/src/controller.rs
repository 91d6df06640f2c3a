//! Process bootstrap: one `kube::runtime::controller::Controller` loop per
//! cluster kind this engine reconciles, run concurrently alongside the
//! `/metrics` + `/healthz` HTTP surface.

use std::sync::Arc;

use futures::stream::StreamExt;
use kube::runtime::{watcher, Controller};
use kube::Api;
use tracing::info;

use engine_core::{ClusterEventSink, ClusterTriggerAuthentication, EventSink, ScalingJobTarget, ScalingTarget, TriggerAuthentication};

use crate::context::Context;
use crate::reconcile::{error_policy, event_sink, scaling_job_target, scaling_target, trigger_authentication};

/// Run every reconciliation loop and the observability HTTP server until
/// shutdown.
pub async fn run(ctx: Arc<Context>) {
    let scaling_targets = Controller::new(Api::<ScalingTarget>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(scaling_target::reconcile, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    let scaling_job_targets = Controller::new(Api::<ScalingJobTarget>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(scaling_job_target::reconcile, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    let trigger_auths = Controller::new(Api::<TriggerAuthentication>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(trigger_authentication::reconcile, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    let cluster_trigger_auths = Controller::new(Api::<ClusterTriggerAuthentication>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(trigger_authentication::reconcile_cluster, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    let event_sinks = Controller::new(Api::<EventSink>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(event_sink::reconcile, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    let cluster_event_sinks = Controller::new(Api::<ClusterEventSink>::all(ctx.client.clone()), watcher::Config::default())
        .shutdown_on_signal()
        .run(event_sink::reconcile_cluster, error_policy, Arc::clone(&ctx))
        .for_each(|_| futures::future::ready(()));

    info!("starting reconciliation loops");
    tokio::join!(
        scaling_targets,
        scaling_job_targets,
        trigger_auths,
        cluster_trigger_auths,
        event_sinks,
        cluster_event_sinks,
        crate::http::serve(Arc::clone(&ctx)),
    );
}
