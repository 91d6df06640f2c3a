//! `TriggerAuthentication` and `ClusterTriggerAuthentication` — reusable
//! credential bundles (spec.md §3.1).

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single `secretKeyRef`-style mapping: a secret key becomes a named
/// credential field.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthSecretTargetRef {
    /// Name of the in-cluster `Secret`.
    pub name: String,
    /// Key within the secret's data map.
    pub key: String,
    /// Name the resolved value is exposed as to the scaler's configuration.
    pub parameter: String,
}

/// An environment variable sourced from a named workload's container spec.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvTargetRef {
    /// Workload (e.g. `Deployment`) name to read the environment from.
    pub deployment_name: String,
    /// Container name within that workload.
    pub container_name: String,
    /// Environment variable name.
    pub env_name: String,
    /// Name the resolved value is exposed as.
    pub parameter: String,
}

/// Requests credentials from a pod-identity provider (workload identity,
/// instance metadata, short-lived token source) instead of static secrets.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodIdentityProvider {
    /// Identity provider name, e.g. `"azure-workload"`, `"aws-eks"`, `"gcp"`.
    pub provider: String,
    /// Identity/role binding the provider resolves against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
}

/// Coordinate for an external secret store (address, mount/namespace, role).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSecretStoreRef {
    /// Store address, e.g. a Vault URL.
    pub address: String,
    /// Mount path or namespace within the store.
    pub mount: String,
    /// Role used to authenticate against the store.
    pub role: String,
    /// Keys to fetch, mapped to the parameter name they are exposed as.
    pub parameters: BTreeMap<String, String>,
}

/// Reusable credential bundle, referencing any combination of secrets, env
/// vars, pod identity, or an external store.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "TriggerAuthentication",
    namespaced,
    status = "TriggerAuthenticationStatus",
    shortname = "ta"
)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAuthenticationSpec {
    /// In-cluster secret references, key by key.
    #[serde(default)]
    pub secret_target_refs: Vec<AuthSecretTargetRef>,
    /// Environment variables read from a named workload.
    #[serde(default)]
    pub env_target_refs: Vec<EnvTargetRef>,
    /// Pod-identity provider binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_identity: Option<PodIdentityProvider>,
    /// External secret store coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_secret_store_ref: Option<ExternalSecretStoreRef>,
}

/// Status of a `TriggerAuthentication`: which targets currently reference
/// it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerAuthenticationStatus {
    /// Names of targets (in the same namespace) currently referencing this
    /// authentication.
    #[serde(default)]
    pub referencing_targets: Vec<String>,
}

/// Cluster-scoped counterpart of [`TriggerAuthenticationSpec`]; identical
/// shape, usable from any namespace.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "ClusterTriggerAuthentication",
    status = "TriggerAuthenticationStatus",
    shortname = "cta"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterTriggerAuthenticationSpec {
    /// In-cluster secret references, key by key.
    #[serde(default)]
    pub secret_target_refs: Vec<AuthSecretTargetRef>,
    /// Environment variables read from a named workload.
    #[serde(default)]
    pub env_target_refs: Vec<EnvTargetRef>,
    /// Pod-identity provider binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_identity: Option<PodIdentityProvider>,
    /// External secret store coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_secret_store_ref: Option<ExternalSecretStoreRef>,
}
