//! `ScalingTarget` reconciliation (spec.md §4.1).
//!
//! The companion `HorizontalPodAutoscaler` (see [`crate::hpa`]) owns the
//! actual in-range scaling decision, reading the external metrics this
//! process's metrics-api service publishes from the scaler cache. This
//! reconciler's own job is everything the autoscaler can't do on its own:
//! build/refresh the scaler cache entry, track activity/cooldown, and pin
//! the companion autoscaler's `min`/`max` to `idleReplicas` or a
//! `paused-replicas` override when the target sits outside its normal
//! `[minReplicas, maxReplicas]` range.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;

use engine_core::{conditions, ScalingTarget, ScalingTargetStatus};
use engine_events::EventKind;
use engine_scalers::auth::HttpExternalSecretStore;
use engine_scalers::scaler::MetricSpec as ScalerMetricSpec;
use engine_scalers::{build_entry, poll_target, TargetKey, DEFAULT_POLL_TIMEOUT};

use crate::activity::ActivityState;
use crate::context::Context;
use crate::error::{ControllerError, Result};
use crate::{events, finalizer, hpa, scale};

const KIND: &str = "ScalingTarget";

const FIELD_MANAGER: &str = "eventscale-controller";
/// Annotation freezing a target at a fixed replica count, mirroring the
/// autoscaler ecosystem's own `paused-replicas` convention.
const PAUSED_REPLICAS_ANNOTATION: &str = "eventscale.example.io/paused-replicas";
/// Boolean annotation pausing a target without naming a replica count; the
/// workload is frozen at whatever replica count it currently holds.
const PAUSED_ANNOTATION: &str = "eventscale.example.io/paused";

/// Reconcile one `ScalingTarget`.
///
/// # Errors
/// Returns [`ControllerError`] for anything that should be retried through
/// [`crate::reconcile::error_policy`] rather than reported as a status
/// condition.
pub async fn reconcile(target: Arc<ScalingTarget>, ctx: Arc<Context>) -> Result<Action> {
    let _permit = Arc::clone(&ctx.reconcile_semaphore).acquire_owned().await.expect("reconcile semaphore closed");
    let namespace = target.namespace().ok_or(ControllerError::MissingNamespace("ScalingTarget", target.name_any()))?;
    let name = target.name_any();
    let api: Api<ScalingTarget> = Api::namespaced(ctx.client.clone(), &namespace);
    let key = TargetKey::scaling_target(&namespace, &name);

    if finalizer::is_deleting(&*target) {
        return finalize(&target, &ctx, &api, &namespace, &name, &key).await;
    }

    finalizer::ensure(&api, &name).await?;

    let was_new = target.status.is_none();

    if let Err(validation_error) = target.spec.validate() {
        let message = validation_error.to_string();
        patch_status(&api, &name, vec![conditions::not_ready("ValidationFailed", &message, Utc::now())], None, None, target.metadata.generation).await?;
        events::emit(&ctx, &namespace, KIND, &name, EventKind::Error, &serde_json::json!({"reason": "ValidationFailed", "message": message})).await;
        return Ok(Action::requeue(Duration::from_secs(300)));
    }

    if let Some(bad) = target.spec.triggers.iter().find(|t| !ctx.registry.is_known(&t.type_)) {
        let message = format!("unknown trigger type {:?}", bad.type_);
        patch_status(&api, &name, vec![conditions::not_ready("UnknownTriggerType", &message, Utc::now())], None, None, target.metadata.generation).await?;
        events::emit(&ctx, &namespace, KIND, &name, EventKind::Error, &serde_json::json!({"reason": "UnknownTriggerType", "message": message})).await;
        return Ok(Action::requeue(Duration::from_secs(300)));
    }

    let current_replicas = match scale::get_replicas(&ctx.client, &namespace, &target.spec.scale_target_ref).await {
        Ok(replicas) => replicas,
        Err(_) => {
            let message = format!("{} {:?} not found or lacks a scale subresource", target.spec.scale_target_ref.kind, target.spec.scale_target_ref.name);
            patch_status(&api, &name, vec![conditions::not_ready("TargetNotFound", &message, Utc::now())], None, None, target.metadata.generation).await?;
            events::emit(&ctx, &namespace, KIND, &name, EventKind::Error, &serde_json::json!({"reason": "TargetNotFound", "message": message})).await;
            return Ok(Action::requeue(Duration::from_secs(30)));
        }
    };

    let original_replica_count = target.status.as_ref().and_then(|s| s.original_replica_count).or(Some(current_replicas));

    let store = HttpExternalSecretStore::new(ctx.global.http.clone());
    let outcome = build_entry(
        &ctx.client,
        &namespace,
        target.metadata.generation.unwrap_or(0),
        &target.spec.triggers,
        &ctx.global,
        &store,
        &ctx.registry,
    )
    .await;

    let rebuilt = !ctx.scalers.is_current(&key, &outcome.entry.fingerprint);
    if rebuilt {
        ctx.scalers.publish(key.clone(), outcome.entry);
    }
    let Some(entry) = ctx.scalers.get(&key) else {
        return Ok(Action::requeue(Duration::from_secs(30)));
    };

    let poll = poll_target(&entry, target.spec.fallback.as_ref(), current_replicas, DEFAULT_POLL_TIMEOUT, target.spec.scaling_modifiers.as_ref()).await;

    let now = Utc::now();
    let should_idle = {
        let mut activity = ctx.activity.lock().await;
        let state = activity.entry(key.clone()).or_insert_with(ActivityState::new);
        state.observe(poll.active, now);
        state.should_idle(target.spec.cooldown_period, now)
    };

    let paused_replicas: Option<i32> = target
        .annotations()
        .get(PAUSED_REPLICAS_ANNOTATION)
        .and_then(|v| v.parse().ok());
    let paused_bool = target.annotations().get(PAUSED_ANNOTATION).is_some_and(|v| v == "true");
    let is_paused = paused_replicas.is_some() || paused_bool;

    // A bare boolean pause (no replica count) freezes the workload at its
    // current replica count rather than a declared one.
    let paused_override = paused_replicas.or(if paused_bool { Some(current_replicas) } else { None });

    let (min_replicas, max_replicas) = if let Some(paused) = paused_override {
        (paused, paused)
    } else if should_idle {
        let idle = target.spec.idle_replicas.unwrap_or(0);
        (idle, idle)
    } else {
        (target.spec.min_replicas, target.spec.max_replicas)
    };

    // `scalingModifiers`, when set, replaces the per-trigger External
    // metrics the companion autoscaler watches with its single composite
    // output (spec.md §4.2).
    if let Some(modifiers) = target.spec.scaling_modifiers.as_ref() {
        let composite_spec = vec![ScalerMetricSpec {
            name: modifiers.metric_name.clone(),
            metric_type: engine_core::MetricType::AverageValue,
            target_value: modifiers.target,
        }];
        hpa::reconcile(&ctx.client, &namespace, &target, &composite_spec, min_replicas, max_replicas).await?;
    } else {
        let metric_specs: Vec<ScalerMetricSpec> = entry.scalers.iter().flat_map(|b| b.scaler.metric_spec()).collect();
        hpa::reconcile(&ctx.client, &namespace, &target, &metric_specs, min_replicas, max_replicas).await?;
    }

    if target.status.as_ref().and_then(|s| s.original_replica_count).is_none() {
        if let Err(err) = scale::patch_replicas(&ctx.client, &namespace, &target.spec.scale_target_ref, current_replicas.max(min_replicas)).await {
            tracing::warn!(%name, %namespace, error = %err, "could not settle replicas onto new min/max bounds");
        }
    }

    let conditions = vec![
        conditions::ready("Reconciled", "", now),
        conditions::active(poll.active, now),
        conditions::fallback(poll.in_fallback, "", now),
        conditions::paused(is_paused, now),
    ];

    patch_status(
        &api,
        &name,
        conditions,
        original_replica_count,
        Some(hpa::companion_name(&target)),
        target.metadata.generation,
    )
    .await?;

    ctx.metrics.scaler_active.with_label_values(&[&namespace, &name, "target"]).set(if poll.active { 1.0 } else { 0.0 });
    ctx.metrics.scaled_object_paused.with_label_values(&[&namespace, &name]).set(if is_paused { 1.0 } else { 0.0 });

    let lifecycle_kind = if was_new { EventKind::Created } else { EventKind::Updated };
    events::emit(&ctx, &namespace, KIND, &name, lifecycle_kind, &serde_json::json!({"minReplicas": min_replicas, "maxReplicas": max_replicas})).await;
    events::emit(&ctx, &namespace, KIND, &name, EventKind::ScalingDecision, &serde_json::json!({"minReplicas": min_replicas, "maxReplicas": max_replicas, "active": poll.active, "paused": is_paused})).await;

    Ok(Action::requeue(Duration::from_secs(u64::from(target.spec.polling_interval))))
}

async fn finalize(
    target: &ScalingTarget,
    ctx: &Context,
    api: &Api<ScalingTarget>,
    namespace: &str,
    name: &str,
    key: &TargetKey,
) -> Result<Action> {
    if !finalizer::has(target) {
        return Ok(Action::await_change());
    }

    if target.spec.restore_to_original_replica_count {
        if let Some(original) = target.status.as_ref().and_then(|s| s.original_replica_count) {
            let _ = scale::patch_replicas(&ctx.client, namespace, &target.spec.scale_target_ref, original).await;
        }
    }

    let _ = hpa::delete(&ctx.client, namespace, target).await;
    ctx.cancel_poll_task(key).await;
    finalizer::remove(api, name).await?;
    events::emit(ctx, namespace, KIND, name, EventKind::Deleted, &serde_json::json!({})).await;

    Ok(Action::await_change())
}

#[allow(clippy::too_many_arguments)]
async fn patch_status(
    api: &Api<ScalingTarget>,
    name: &str,
    conditions: Vec<engine_core::Condition>,
    original_replica_count: Option<i32>,
    companion_autoscaler_name: Option<String>,
    observed_generation: Option<i64>,
) -> Result<()> {
    let status = ScalingTargetStatus {
        conditions,
        original_replica_count,
        companion_autoscaler_name,
        observed_fingerprint: None,
        observed_generation,
    };
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;
    Ok(())
}
