//! Classify dispatched `batch/v1` `Job`s by outcome (spec.md §4.4 step 2).

use k8s_openapi::api::batch::v1::Job;

/// The four buckets every job dispatched for a `ScalingJobTarget` falls
/// into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// `status.succeeded > 0`.
    Completed,
    /// `status.failed > 0` and not already counted as completed.
    Failed,
    /// At least one pod running, or already succeeded and still counted as
    /// occupying a concurrency slot until garbage-collected (spec.md §4.4:
    /// "at least one pod running or succeeded").
    Running,
    /// No pods yet scheduled.
    Pending,
}

/// Classify one job's current state.
#[must_use]
pub fn classify(job: &Job) -> JobState {
    let Some(status) = &job.status else { return JobState::Pending };

    if status.succeeded.unwrap_or(0) > 0 {
        return JobState::Running;
    }
    if status.failed.unwrap_or(0) > 0 {
        return JobState::Failed;
    }
    if status.active.unwrap_or(0) > 0 {
        return JobState::Running;
    }
    JobState::Pending
}

/// Whether `classify(job)` would return [`JobState::Completed`]. Distinct
/// from [`JobState::Running`]'s "succeeded counts as running until GC'd"
/// rule: this is the terminal-success check the garbage collector and
/// history trimming use, independent of whether the job still occupies a
/// concurrency slot.
#[must_use]
pub fn is_terminally_succeeded(job: &Job) -> bool {
    job.status.as_ref().is_some_and(|s| s.succeeded.unwrap_or(0) > 0 && s.active.unwrap_or(0) == 0)
}

/// Whether a job has terminally failed (no more pods active, at least one
/// failure recorded).
#[must_use]
pub fn is_terminally_failed(job: &Job) -> bool {
    job.status.as_ref().is_some_and(|s| s.failed.unwrap_or(0) > 0 && s.active.unwrap_or(0) == 0 && s.succeeded.unwrap_or(0) == 0)
}

/// Completion time used for oldest-first garbage collection ordering,
/// falling back to the start time, then the epoch, if unset.
#[must_use]
pub fn completion_time(job: &Job) -> chrono::DateTime<chrono::Utc> {
    job.status
        .as_ref()
        .and_then(|s| s.completion_time.as_ref().or(s.start_time.as_ref()))
        .map(|t| t.0)
        .unwrap_or_else(|| chrono::DateTime::from_timestamp(0, 0).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::JobStatus;

    fn job_with_status(status: JobStatus) -> Job {
        Job { status: Some(status), ..Default::default() }
    }

    #[test]
    fn no_status_is_pending() {
        assert_eq!(classify(&Job::default()), JobState::Pending);
    }

    #[test]
    fn active_pods_are_running() {
        let job = job_with_status(JobStatus { active: Some(1), ..Default::default() });
        assert_eq!(classify(&job), JobState::Running);
    }

    #[test]
    fn succeeded_counts_as_running_until_gc() {
        let job = job_with_status(JobStatus { succeeded: Some(1), ..Default::default() });
        assert_eq!(classify(&job), JobState::Running);
        assert!(is_terminally_succeeded(&job));
    }

    #[test]
    fn failed_with_no_active_pods_is_failed() {
        let job = job_with_status(JobStatus { failed: Some(1), ..Default::default() });
        assert_eq!(classify(&job), JobState::Failed);
        assert!(is_terminally_failed(&job));
    }
}
