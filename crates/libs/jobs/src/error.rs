use thiserror::Error;

/// Errors raised while computing, dispatching, or garbage-collecting jobs
/// for a `ScalingJobTarget`.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("job template is missing required field: {0}")]
    MissingTemplateField(&'static str),

    #[error("failed to serialize job template: {0}")]
    Serialize(#[from] serde_json::Error),
}
