//! Trigger-authentication resolution (spec.md §9 "Credential providers").
//!
//! Resolves a [`AuthenticationRef`] against the cluster plus, for the
//! external-secret-store variant, a pluggable store client. Each variant
//! yields a flat `Map<String, String>` of resolved secrets; the external
//! store variant additionally refreshes on demand rather than once at
//! build time, since its tokens are short-lived.

use std::collections::BTreeMap;

use async_trait::async_trait;
use engine_core::trigger::{AuthenticationRef, AuthenticationRefKind};
use engine_core::{
    AuthSecretTargetRef, ClusterTriggerAuthentication, EnvTargetRef, ExternalSecretStoreRef,
    PodIdentityProvider, TriggerAuthentication, TriggerAuthenticationSpec,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{EnvVarSource, Secret};
use kube::{Api, Client};

use crate::error::BuildError;

/// Resolved authentication content for one trigger: static secrets plus an
/// optional pod-identity switch the scaler factory reacts to.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAuth {
    /// Flat map of parameter name to resolved value.
    pub secrets: BTreeMap<String, String>,
    /// Set when the authentication declares a pod-identity provider; the
    /// scaler factory uses this instead of (or alongside) `secrets`.
    pub pod_identity: Option<PodIdentityProvider>,
}

/// A pluggable external secret-store client. Distinct from the in-cluster
/// secret/env paths because external stores are a true external
/// collaborator (spec.md §1): the engine speaks a small uniform interface
/// to them, never a store-specific SDK.
#[async_trait]
pub trait ExternalSecretStore: Send + Sync {
    /// Fetch the values named by `parameters` (store key -> resolved
    /// parameter name) from the given coordinate.
    async fn fetch(
        &self,
        store_ref: &ExternalSecretStoreRef,
    ) -> Result<BTreeMap<String, String>, BuildError>;
}

/// Default external-store client: a plain HTTP GET per key against
/// `{address}/v1/{mount}/{key}?role={role}`, returning a bare text value.
/// This is the uniform-interface stand-in spec.md §9 calls for; a real
/// deployment swaps in a store-specific client behind the same trait.
pub struct HttpExternalSecretStore {
    client: reqwest::Client,
}

impl HttpExternalSecretStore {
    /// Build a client using the shared HTTP client settings.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExternalSecretStore for HttpExternalSecretStore {
    async fn fetch(
        &self,
        store_ref: &ExternalSecretStoreRef,
    ) -> Result<BTreeMap<String, String>, BuildError> {
        let mut out = BTreeMap::new();
        for (key, parameter) in &store_ref.parameters {
            let url = format!(
                "{}/v1/{}/{}?role={}",
                store_ref.address.trim_end_matches('/'),
                store_ref.mount,
                key,
                store_ref.role
            );
            let value = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?
                .error_for_status()
                .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?
                .text()
                .await
                .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?;
            out.insert(parameter.clone(), value);
        }
        Ok(out)
    }
}

/// Resolve a trigger's `authenticationRef`, if any, into flat secret
/// content. Returns an empty, pod-identity-less [`ResolvedAuth`] when the
/// trigger declares no authentication.
pub async fn resolve(
    client: &Client,
    namespace: &str,
    auth_ref: Option<&AuthenticationRef>,
    store: &dyn ExternalSecretStore,
) -> Result<ResolvedAuth, BuildError> {
    let Some(auth_ref) = auth_ref else {
        return Ok(ResolvedAuth::default());
    };

    let spec = match auth_ref.kind {
        AuthenticationRefKind::TriggerAuthentication => {
            let api: Api<TriggerAuthentication> = Api::namespaced(client.clone(), namespace);
            api.get(&auth_ref.name)
                .await
                .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?
                .spec
        }
        AuthenticationRefKind::ClusterTriggerAuthentication => {
            let api: Api<ClusterTriggerAuthentication> = Api::all(client.clone());
            let cta = api
                .get(&auth_ref.name)
                .await
                .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?;
            TriggerAuthenticationSpec {
                secret_target_refs: cta.spec.secret_target_refs,
                env_target_refs: cta.spec.env_target_refs,
                pod_identity: cta.spec.pod_identity,
                external_secret_store_ref: cta.spec.external_secret_store_ref,
            }
        }
    };

    resolve_spec(client, namespace, &spec, store).await
}

async fn resolve_spec(
    client: &Client,
    namespace: &str,
    spec: &TriggerAuthenticationSpec,
    store: &dyn ExternalSecretStore,
) -> Result<ResolvedAuth, BuildError> {
    let mut secrets = BTreeMap::new();

    for secret_ref in &spec.secret_target_refs {
        let value = resolve_secret_key(client, namespace, secret_ref).await?;
        secrets.insert(secret_ref.parameter.clone(), value);
    }

    for env_ref in &spec.env_target_refs {
        let value = resolve_env(client, namespace, env_ref).await?;
        secrets.insert(env_ref.parameter.clone(), value);
    }

    if let Some(external) = &spec.external_secret_store_ref {
        let fetched = store.fetch(external).await?;
        secrets.extend(fetched);
    }

    Ok(ResolvedAuth {
        secrets,
        pod_identity: spec.pod_identity.clone(),
    })
}

async fn resolve_secret_key(
    client: &Client,
    namespace: &str,
    secret_ref: &AuthSecretTargetRef,
) -> Result<String, BuildError> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let secret = api
        .get(&secret_ref.name)
        .await
        .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?;
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(&secret_ref.key))
        .ok_or_else(|| {
            BuildError::AuthenticationResolution(format!(
                "secret {} has no key {:?}",
                secret_ref.name, secret_ref.key
            ))
        })?;
    String::from_utf8(bytes.0.clone())
        .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))
}

async fn resolve_env(
    client: &Client,
    namespace: &str,
    env_ref: &EnvTargetRef,
) -> Result<String, BuildError> {
    let api: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    let deployment = api
        .get(&env_ref.deployment_name)
        .await
        .map_err(|e| BuildError::AuthenticationResolution(e.to_string()))?;

    let containers = deployment
        .spec
        .and_then(|s| s.template.spec)
        .map(|s| s.containers)
        .unwrap_or_default();

    let container = containers
        .into_iter()
        .find(|c| c.name == env_ref.container_name)
        .ok_or_else(|| {
            BuildError::AuthenticationResolution(format!(
                "deployment {} has no container {:?}",
                env_ref.deployment_name, env_ref.container_name
            ))
        })?;

    let env_var = container
        .env
        .unwrap_or_default()
        .into_iter()
        .find(|e| e.name == env_ref.env_name)
        .ok_or_else(|| {
            BuildError::AuthenticationResolution(format!(
                "container {} has no env var {:?}",
                env_ref.container_name, env_ref.env_name
            ))
        })?;

    if let Some(value) = env_var.value {
        return Ok(value);
    }

    match env_var.value_from {
        Some(EnvVarSource {
            secret_key_ref: Some(secret_key_ref),
            ..
        }) => {
            resolve_secret_key(
                client,
                namespace,
                &AuthSecretTargetRef {
                    name: secret_key_ref.name,
                    key: secret_key_ref.key,
                    parameter: env_ref.parameter.clone(),
                },
            )
            .await
        }
        _ => Err(BuildError::AuthenticationResolution(format!(
            "env var {:?} has neither a literal value nor a secretKeyRef",
            env_ref.env_name
        ))),
    }
}
