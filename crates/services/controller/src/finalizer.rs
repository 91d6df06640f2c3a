//! Finalizer add/remove helpers (spec.md §3.2 invariant 5: "no scaler
//! instance survives its owning target").
//!
//! Grounded on the strimzi backup operator's `add_finalizer`/
//! `remove_finalizer` merge-patch idiom.

use kube::api::{Api, Patch, PatchParams};
use kube::Resource;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Finalizer stamped on every target this engine reconciles.
pub const FINALIZER: &str = "eventscale.example.io/finalizer";

const FIELD_MANAGER: &str = "eventscale-controller";

/// Add [`FINALIZER`] to `name` if not already present.
///
/// # Errors
/// Returns [`kube::Error`] if the patch call fails.
pub async fn ensure<K>(api: &Api<K>, name: &str) -> kube::Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    let patch = serde_json::json!({ "metadata": { "finalizers": [FINALIZER] } });
    api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Remove [`FINALIZER`] from `name`.
///
/// # Errors
/// Returns [`kube::Error`] if the patch call fails.
pub async fn remove<K>(api: &Api<K>, name: &str) -> kube::Result<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    let patch = serde_json::json!({ "metadata": { "finalizers": null } });
    api.patch(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch)).await?;
    Ok(())
}

/// Whether `obj` already carries [`FINALIZER`].
#[must_use]
pub fn has<K: Resource>(obj: &K) -> bool {
    obj.meta().finalizers.as_ref().is_some_and(|f| f.iter().any(|x| x == FINALIZER))
}

/// Whether `obj` is in the middle of being deleted.
#[must_use]
pub fn is_deleting<K: Resource>(obj: &K) -> bool {
    obj.meta().deletion_timestamp.is_some()
}
