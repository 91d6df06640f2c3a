//! Oldest-first history garbage collection (spec.md §4.4:
//! `successfulJobsHistoryLimit` / `failedJobsHistoryLimit`).

use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, DeleteParams};
use kube::{Client, ResourceExt};

use crate::classify::{completion_time, is_terminally_failed, is_terminally_succeeded};
use crate::error::JobError;

/// Split `jobs` into terminally-succeeded and terminally-failed, oldest
/// first, then delete whichever tail of each list exceeds its configured
/// limit.
///
/// # Errors
/// Returns [`JobError::Kube`] if a delete call fails; jobs already deleted
/// before the failing call stay deleted.
pub async fn collect(
    client: &Client,
    namespace: &str,
    jobs: &[Job],
    successful_limit: i32,
    failed_limit: i32,
) -> Result<usize, JobError> {
    let mut succeeded: Vec<&Job> = jobs.iter().filter(|j| is_terminally_succeeded(j)).collect();
    let mut failed: Vec<&Job> = jobs.iter().filter(|j| is_terminally_failed(j)).collect();

    succeeded.sort_by_key(|j| completion_time(j));
    failed.sort_by_key(|j| completion_time(j));

    let api: Api<Job> = Api::namespaced(client.clone(), namespace);
    let mut deleted = 0;

    for stale in oldest_overflow(&succeeded, successful_limit) {
        delete_job(&api, stale).await?;
        deleted += 1;
    }
    for stale in oldest_overflow(&failed, failed_limit) {
        delete_job(&api, stale).await?;
        deleted += 1;
    }

    Ok(deleted)
}

fn oldest_overflow<'a>(sorted_oldest_first: &[&'a Job], limit: i32) -> Vec<&'a Job> {
    let limit = limit.max(0) as usize;
    let overflow = sorted_oldest_first.len().saturating_sub(limit);
    sorted_oldest_first[..overflow].to_vec()
}

async fn delete_job(api: &Api<Job>, job: &Job) -> Result<(), JobError> {
    let name = job.name_any();
    let params = DeleteParams { propagation_policy: Some(kube::api::PropagationPolicy::Background), ..Default::default() };
    let _ = api.delete(&name, &params).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::JobStatus;
    use kube::api::ObjectMeta;

    fn succeeded_job(name: &str, completed_at: i64) -> Job {
        Job {
            metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            status: Some(JobStatus {
                succeeded: Some(1),
                completion_time: Some(k8s_openapi::apimachinery::pkg::apis::meta::v1::Time(
                    chrono::DateTime::from_timestamp(completed_at, 0).unwrap(),
                )),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn overflow_keeps_newest_n() {
        let jobs = vec![succeeded_job("a", 1), succeeded_job("b", 2), succeeded_job("c", 3)];
        let refs: Vec<&Job> = jobs.iter().collect();
        let overflow = oldest_overflow(&refs, 2);
        assert_eq!(overflow.len(), 1);
        assert_eq!(overflow[0].name_any(), "a");
    }

    #[test]
    fn no_overflow_when_under_limit() {
        let jobs = vec![succeeded_job("a", 1)];
        let refs: Vec<&Job> = jobs.iter().collect();
        assert!(oldest_overflow(&refs, 5).is_empty());
    }
}
