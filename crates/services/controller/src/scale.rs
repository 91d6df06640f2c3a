//! Reading and patching the replica count of a `ScaleTargetRef` (spec.md
//! §4.1 step 1, §9 "Scale subresource").
//!
//! Dispatches over the small set of workload kinds a `ScaleTargetRef`
//! realistically names, rather than one hard-coded `Api<Deployment>`
//! client. Modeled on a deployment-pause action's
//! `Api<Deployment>`/`Api<StatefulSet>` `get_scale`/`patch_scale` pair
//! against `autoscaling/v1.Scale`.

use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;

use engine_core::ScaleTargetRef;

use crate::error::{ControllerError, Result};

const FIELD_MANAGER: &str = "eventscale-controller";

/// Read the current replica count of `reference` in `namespace`.
///
/// # Errors
/// Returns [`ControllerError::MissingNamespace`] if the object lacks a
/// scale subresource for an unsupported kind, or [`ControllerError::Kube`]
/// if the API call fails.
pub async fn get_replicas(client: &Client, namespace: &str, reference: &ScaleTargetRef) -> Result<i32> {
    match reference.kind.as_str() {
        "Deployment" => {
            let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
            Ok(api.get_scale(&reference.name).await?.spec.and_then(|s| s.replicas).unwrap_or(0))
        }
        "StatefulSet" => {
            let api: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
            Ok(api.get_scale(&reference.name).await?.spec.and_then(|s| s.replicas).unwrap_or(0))
        }
        "ReplicaSet" => {
            let api: Api<ReplicaSet> = Api::namespaced(client.clone(), namespace);
            Ok(api.get_scale(&reference.name).await?.spec.and_then(|s| s.replicas).unwrap_or(0))
        }
        other => Err(ControllerError::UnsupportedScaleKind(other.to_string())),
    }
}

/// Patch `reference`'s replica count to `replicas` via its scale subresource.
///
/// # Errors
/// Returns [`ControllerError::UnsupportedScaleKind`] for a kind this engine
/// doesn't know how to scale, or [`ControllerError::Kube`] if the patch
/// call fails.
pub async fn patch_replicas(client: &Client, namespace: &str, reference: &ScaleTargetRef, replicas: i32) -> Result<()> {
    let patch = Patch::Merge(Scale {
        metadata: Default::default(),
        spec: Some(ScaleSpec { replicas: Some(replicas) }),
        status: None,
    });
    let params = PatchParams::apply(FIELD_MANAGER);

    match reference.kind.as_str() {
        "Deployment" => {
            let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
            api.patch_scale(&reference.name, &params, &patch).await?;
        }
        "StatefulSet" => {
            let api: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
            api.patch_scale(&reference.name, &params, &patch).await?;
        }
        "ReplicaSet" => {
            let api: Api<ReplicaSet> = Api::namespaced(client.clone(), namespace);
            api.patch_scale(&reference.name, &params, &patch).await?;
        }
        other => return Err(ControllerError::UnsupportedScaleKind(other.to_string())),
    }
    Ok(())
}

/// Whether `reference` exists at all (used to detect `TargetNotFound`
/// before anything else, spec.md §4.1 step 1).
pub async fn exists(client: &Client, namespace: &str, reference: &ScaleTargetRef) -> bool {
    get_replicas(client, namespace, reference).await.is_ok()
}
