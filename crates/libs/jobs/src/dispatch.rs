//! Job dispatch (spec.md §4.4): stamp `N` copies of a `ScalingJobTarget`'s
//! job template, labeled so the next reconcile can list and classify them.

use chrono::Utc;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use kube::{Api, Client, ResourceExt};
use std::collections::BTreeMap;

use engine_core::ScalingJobTarget;

use crate::error::JobError;

/// Label applied to every job this engine dispatches, used both to list a
/// target's jobs back (`list_owned`) and to identify them as ours on
/// cleanup.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
/// Value of [`MANAGED_BY_LABEL`] this crate stamps.
pub const MANAGED_BY_VALUE: &str = "eventscale";
/// Label carrying the owning `ScalingJobTarget`'s name.
pub const OWNER_LABEL: &str = "eventscale.example.io/scaling-job-target";

fn owned_labels(owner_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (OWNER_LABEL.to_string(), owner_name.to_string()),
    ])
}

/// Label selector string matching jobs dispatched for `owner_name`.
#[must_use]
pub fn owned_label_selector(owner_name: &str) -> String {
    format!("{MANAGED_BY_LABEL}={MANAGED_BY_VALUE},{OWNER_LABEL}={owner_name}")
}

fn owner_reference(target: &ScalingJobTarget) -> OwnerReference {
    OwnerReference {
        api_version: format!("{}/{}", engine_core::API_GROUP, engine_core::API_VERSION),
        kind: "ScalingJobTarget".to_string(),
        name: target.name_any(),
        uid: target.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Build one job from `target`'s template, stamped with a unique name,
/// owner reference, and management labels.
#[must_use]
pub fn build_job(target: &ScalingJobTarget, namespace: &str, sequence: u64) -> Job {
    let owner_name = target.name_any();
    let job_name = format!("{owner_name}-{}-{sequence}", Utc::now().format("%Y%m%d%H%M%S"));

    let mut template = target.spec.job_target_ref.clone();
    if let Some(pod_template) = template.template.metadata.as_mut() {
        let labels = pod_template.labels.get_or_insert_with(BTreeMap::new);
        labels.extend(owned_labels(&owner_name));
    } else {
        let mut meta = ObjectMeta::default();
        meta.labels = Some(owned_labels(&owner_name));
        template.template.metadata = Some(meta);
    }

    // Jobs never accept `restartPolicy: Always` (the `PodSpec` default when
    // unset); rewrite it the way the cluster's own admission behavior would
    // (spec.md §4.4 "Rollout": "Default jobs observe the cluster's standard
    // restart-policy rewrite").
    let pod_spec = template.template.spec.get_or_insert_with(Default::default);
    if pod_spec.restart_policy.as_deref() != Some("Never") {
        pod_spec.restart_policy = Some("OnFailure".to_string());
    }

    Job {
        metadata: ObjectMeta {
            name: Some(job_name),
            namespace: Some(namespace.to_string()),
            labels: Some(owned_labels(&owner_name)),
            owner_references: Some(vec![owner_reference(target)]),
            ..Default::default()
        },
        spec: Some(template),
        status: None,
    }
}

/// Dispatch `count` new jobs for `target`, returning the created objects.
///
/// # Errors
/// Returns [`JobError::Kube`] if any creation call fails; jobs already
/// created before the failing call are not rolled back, matching
/// Kubernetes' own at-least-once creation semantics.
pub async fn dispatch(
    client: &Client,
    target: &ScalingJobTarget,
    namespace: &str,
    count: i64,
    sequence_start: u64,
) -> Result<Vec<Job>, JobError> {
    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    let mut created = Vec::with_capacity(count.max(0) as usize);

    for offset in 0..count.max(0) {
        #[allow(clippy::cast_sign_loss)]
        let job = build_job(target, namespace, sequence_start + offset as u64);
        let created_job = api.create(&kube::api::PostParams::default(), &job).await?;
        created.push(created_job);
    }

    Ok(created)
}

/// List every job currently owned by `target`.
///
/// # Errors
/// Returns [`JobError::Kube`] if the list call fails.
pub async fn list_owned(client: &Client, target: &ScalingJobTarget, namespace: &str) -> Result<Vec<Job>, JobError> {
    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    let params = kube::api::ListParams::default().labels(&owned_label_selector(&target.name_any()));
    let list = api.list(&params).await?;
    Ok(list.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::JobSpec;
    use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
    use kube::api::ObjectMeta as K8sObjectMeta;

    fn sample_target() -> ScalingJobTarget {
        ScalingJobTarget::new(
            "processor",
            engine_core::ScalingJobTargetSpec {
                job_target_ref: JobSpec {
                    template: PodTemplateSpec {
                        metadata: Some(K8sObjectMeta::default()),
                        spec: Some(PodSpec::default()),
                    },
                    ..Default::default()
                },
                triggers: vec![],
                max_replica_count: 10,
                successful_jobs_history_limit: 5,
                failed_jobs_history_limit: 5,
                scaling_strategy: engine_core::crds::ScalingStrategy::default(),
                custom_queue_length_deduction: 0,
                custom_running_job_percentage: 0.0,
                rollout_strategy: engine_core::crds::JobRolloutStrategy::default(),
                polling_interval: 30,
                fallback: None,
            },
        )
    }

    #[test]
    fn build_job_stamps_owner_and_labels() {
        let target = sample_target();
        let job = build_job(&target, "default", 1);
        assert!(job.metadata.name.unwrap().starts_with("processor-"));
        assert_eq!(job.metadata.namespace.as_deref(), Some("default"));
        let owner_refs = job.metadata.owner_references.unwrap();
        assert_eq!(owner_refs[0].kind, "ScalingJobTarget");
        assert_eq!(owner_refs[0].name, "processor");
        assert_eq!(job.metadata.labels.unwrap().get(OWNER_LABEL), Some(&"processor".to_string()));
    }

    #[test]
    fn selector_matches_labels() {
        let target = sample_target();
        let job = build_job(&target, "default", 1);
        let selector = owned_label_selector(&target.name_any());
        assert!(selector.contains(MANAGED_BY_VALUE));
        assert!(job.metadata.labels.unwrap().get(MANAGED_BY_LABEL) == Some(&MANAGED_BY_VALUE.to_string()));
    }
}
