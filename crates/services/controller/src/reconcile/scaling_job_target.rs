//! `ScalingJobTarget` reconciliation (spec.md §4.4).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;

use engine_core::crds::JobRolloutStrategy;
use engine_core::{conditions, ScalingJobTarget, ScalingJobTargetStatus};
use engine_events::EventKind;
use engine_jobs::{classify, collect_garbage, dispatch, jobs_to_dispatch, list_owned, reconcile_rollout, JobState, StrategyInput};
use engine_scalers::auth::HttpExternalSecretStore;
use engine_scalers::{build_entry, poll_target, TargetKey, DEFAULT_POLL_TIMEOUT};

use crate::activity::ActivityState;
use crate::context::Context;
use crate::error::{ControllerError, Result};
use crate::{events, finalizer};

const FIELD_MANAGER: &str = "eventscale-controller";
const KIND: &str = "ScalingJobTarget";

/// Reconcile one `ScalingJobTarget`.
///
/// # Errors
/// Returns [`ControllerError`] for anything [`crate::reconcile::error_policy`]
/// should retry.
pub async fn reconcile(target: Arc<ScalingJobTarget>, ctx: Arc<Context>) -> Result<Action> {
    let _permit = Arc::clone(&ctx.reconcile_semaphore).acquire_owned().await.expect("reconcile semaphore closed");
    let namespace = target.namespace().ok_or(ControllerError::MissingNamespace("ScalingJobTarget", target.name_any()))?;
    let name = target.name_any();
    let api: Api<ScalingJobTarget> = Api::namespaced(ctx.client.clone(), &namespace);
    let key = TargetKey::scaling_job_target(&namespace, &name);

    if finalizer::is_deleting(&*target) {
        if finalizer::has(&*target) {
            ctx.cancel_poll_task(&key).await;
            finalizer::remove(&api, &name).await?;
            events::emit(&ctx, &namespace, KIND, &name, EventKind::Deleted, &serde_json::json!({})).await;
        }
        return Ok(Action::await_change());
    }
    finalizer::ensure(&api, &name).await?;

    let was_new = target.status.is_none();

    if let Err(validation_error) = target.spec.validate() {
        let message = validation_error.to_string();
        patch_status(&api, &name, vec![conditions::not_ready("ValidationFailed", &message, Utc::now())], None, target.metadata.generation).await?;
        events::emit(&ctx, &namespace, KIND, &name, EventKind::Error, &serde_json::json!({"reason": "ValidationFailed", "message": message})).await;
        return Ok(Action::requeue(Duration::from_secs(300)));
    }

    if let Some(bad) = target.spec.triggers.iter().find(|t| !ctx.registry.is_known(&t.type_)) {
        let message = format!("unknown trigger type {:?}", bad.type_);
        patch_status(&api, &name, vec![conditions::not_ready("UnknownTriggerType", &message, Utc::now())], None, target.metadata.generation).await?;
        events::emit(&ctx, &namespace, KIND, &name, EventKind::Error, &serde_json::json!({"reason": "UnknownTriggerType", "message": message})).await;
        return Ok(Action::requeue(Duration::from_secs(300)));
    }

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

    let poll = poll_target(&entry, target.spec.fallback.as_ref(), 0, DEFAULT_POLL_TIMEOUT, None).await;

    let aggregated: i64 = entry
        .scalers
        .iter()
        .flat_map(|built| built.scaler.metric_spec())
        .filter_map(|spec| {
            poll.samples
                .iter()
                .find(|s| s.name == spec.name)
                .map(|s| (s.value / spec.target_value).ceil() as i64)
        })
        .sum();

    let jobs = list_owned(&ctx.client, &target, &namespace).await?;
    let running = jobs.iter().filter(|j| classify(j) == JobState::Running).count() as i64;
    let pending = jobs.iter().filter(|j| classify(j) == JobState::Pending).count() as i64;

    if rebuilt && target.spec.rollout_strategy == JobRolloutStrategy::Immediate {
        let running_jobs: Vec<_> = jobs.iter().filter(|j| classify(j) == JobState::Running).cloned().collect();
        reconcile_rollout(&ctx.client, &namespace, target.spec.rollout_strategy, &running_jobs).await?;
    }

    let to_dispatch = jobs_to_dispatch(
        target.spec.scaling_strategy,
        StrategyInput {
            aggregated,
            running,
            pending,
            max_replica_count: target.spec.max_replica_count,
            custom_queue_length_deduction: target.spec.custom_queue_length_deduction,
            custom_running_job_percentage: target.spec.custom_running_job_percentage,
        },
    );
    if to_dispatch > 0 && poll.active {
        dispatch(&ctx.client, &target, &namespace, to_dispatch, 0).await?;
        events::emit(&ctx, &namespace, KIND, &name, EventKind::ScalingDecision, &serde_json::json!({"jobsCreated": to_dispatch, "running": running, "pending": pending})).await;
    }

    collect_garbage(&ctx.client, &namespace, &jobs, target.spec.successful_jobs_history_limit, target.spec.failed_jobs_history_limit).await?;

    let now = Utc::now();
    let last_active_time = if poll.active {
        Some(now)
    } else {
        target.status.as_ref().and_then(|s| s.last_active_time)
    };

    let conditions = vec![
        conditions::ready("Reconciled", "", now),
        conditions::active(poll.active, now),
        conditions::fallback(poll.in_fallback, "", now),
    ];
    patch_status(&api, &name, conditions, last_active_time, target.metadata.generation).await?;

    ctx.metrics.scaler_active.with_label_values(&[&namespace, &name, "job-target"]).set(if poll.active { 1.0 } else { 0.0 });

    let lifecycle_kind = if was_new { EventKind::Created } else { EventKind::Updated };
    events::emit(&ctx, &namespace, KIND, &name, lifecycle_kind, &serde_json::json!({"running": running, "pending": pending})).await;

    Ok(Action::requeue(Duration::from_secs(u64::from(target.spec.polling_interval))))
}

async fn patch_status(
    api: &Api<ScalingJobTarget>,
    name: &str,
    conditions: Vec<engine_core::Condition>,
    last_active_time: Option<chrono::DateTime<Utc>>,
    observed_generation: Option<i64>,
) -> Result<()> {
    let status = ScalingJobTargetStatus { conditions, last_active_time, observed_fingerprint: None, observed_generation };
    let patch = serde_json::json!({ "status": status });
    api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;
    Ok(())
}
