//! `TriggerAuthentication` / `ClusterTriggerAuthentication` reconciliation
//! (spec.md §3.1, §9 "Credential providers").
//!
//! Resolved authentication content feeds directly into each target's
//! fingerprint (`engine_core::fingerprint_of`), and every `ScalingTarget`/
//! `ScalingJobTarget` reconcile recomputes that fingerprint from scratch on
//! every tick — so a credential rotation here invalidates the scaler cache
//! the next time the referencing target reconciles, with no separate fan-out
//! step required. This reconciler's own job is narrower: keep
//! `status.referencingTargets` current for operator visibility.

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;

use engine_core::trigger::AuthenticationRefKind;
use engine_core::{ClusterTriggerAuthentication, ScalingJobTarget, ScalingTarget, TriggerAuthentication, TriggerAuthenticationStatus};

use crate::context::Context;
use crate::error::Result;

const FIELD_MANAGER: &str = "eventscale-controller";
const REQUEUE_INTERVAL: Duration = Duration::from_secs(60);

/// Reconcile one namespaced `TriggerAuthentication`.
///
/// # Errors
/// Returns [`crate::error::ControllerError`] on a Kubernetes API failure.
pub async fn reconcile(auth: Arc<TriggerAuthentication>, ctx: Arc<Context>) -> Result<Action> {
    let Some(namespace) = auth.namespace() else { return Ok(Action::await_change()) };
    let name = auth.name_any();

    let targets: Api<ScalingTarget> = Api::namespaced(ctx.client.clone(), &namespace);
    let job_targets: Api<ScalingJobTarget> = Api::namespaced(ctx.client.clone(), &namespace);

    let mut referencing = Vec::new();
    for target in targets.list(&ListParams::default()).await?.items {
        if references(&target.spec.triggers, &name, AuthenticationRefKind::TriggerAuthentication) {
            referencing.push(target.name_any());
        }
    }
    for target in job_targets.list(&ListParams::default()).await?.items {
        if references(&target.spec.triggers, &name, AuthenticationRefKind::TriggerAuthentication) {
            referencing.push(target.name_any());
        }
    }

    let api: Api<TriggerAuthentication> = Api::namespaced(ctx.client.clone(), &namespace);
    let status = TriggerAuthenticationStatus { referencing_targets: referencing };
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;

    Ok(Action::requeue(REQUEUE_INTERVAL))
}

/// Reconcile one cluster-scoped `ClusterTriggerAuthentication`.
///
/// # Errors
/// Returns [`crate::error::ControllerError`] on a Kubernetes API failure.
pub async fn reconcile_cluster(auth: Arc<ClusterTriggerAuthentication>, ctx: Arc<Context>) -> Result<Action> {
    let name = auth.name_any();

    let targets: Api<ScalingTarget> = Api::all(ctx.client.clone());
    let job_targets: Api<ScalingJobTarget> = Api::all(ctx.client.clone());

    let mut referencing = Vec::new();
    for target in targets.list(&ListParams::default()).await?.items {
        if references(&target.spec.triggers, &name, AuthenticationRefKind::ClusterTriggerAuthentication) {
            referencing.push(format!("{}/{}", target.namespace().unwrap_or_default(), target.name_any()));
        }
    }
    for target in job_targets.list(&ListParams::default()).await?.items {
        if references(&target.spec.triggers, &name, AuthenticationRefKind::ClusterTriggerAuthentication) {
            referencing.push(format!("{}/{}", target.namespace().unwrap_or_default(), target.name_any()));
        }
    }

    let api: Api<ClusterTriggerAuthentication> = Api::all(ctx.client.clone());
    let status = TriggerAuthenticationStatus { referencing_targets: referencing };
    let patch = serde_json::json!({ "status": status });
    api.patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;

    Ok(Action::requeue(REQUEUE_INTERVAL))
}

fn references(triggers: &[engine_core::Trigger], name: &str, kind: AuthenticationRefKind) -> bool {
    triggers.iter().any(|t| t.authentication_ref.as_ref().is_some_and(|r| r.name == name && r.kind == kind))
}
