//! Rollout strategy (spec.md §4.4): what happens to in-flight jobs when a
//! `ScalingJobTarget`'s spec (and therefore its job template) changes.

use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, DeleteParams};
use kube::{Client, ResourceExt};

use engine_core::crds::JobRolloutStrategy;

use crate::classify::{classify, JobState};
use crate::error::JobError;

/// Apply `strategy` to `running_jobs` after an observed fingerprint change.
/// [`JobRolloutStrategy::Default`] leaves them to finish;
/// [`JobRolloutStrategy::Immediate`] deletes every job still classified
/// [`JobState::Running`], returning how many were deleted.
///
/// # Errors
/// Returns [`JobError::Kube`] if a delete call fails.
pub async fn reconcile_rollout(
    client: &Client,
    namespace: &str,
    strategy: JobRolloutStrategy,
    running_jobs: &[Job],
) -> Result<usize, JobError> {
    if strategy == JobRolloutStrategy::Default {
        return Ok(0);
    }

    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    let mut deleted = 0;
    for job in running_jobs {
        if classify(job) != JobState::Running {
            continue;
        }
        let name = job.name_any();
        let params = DeleteParams { propagation_policy: Some(kube::api::PropagationPolicy::Foreground), ..Default::default() };
        api.delete(&name, &params).await?;
        deleted += 1;
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_not_immediate() {
        assert_eq!(JobRolloutStrategy::default(), JobRolloutStrategy::Default);
    }
}
