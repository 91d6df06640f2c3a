//! Error types for the `eventscale` controller.

use thiserror::Error;

/// Errors that can occur while reconciling a target.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// HTTP request error (event delivery, EventSink reachability probes).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Kubernetes API error.
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// Structural validation failed (spec.md §7 "Validation").
    #[error("validation failed: {0}")]
    Validation(#[from] engine_core::ValidationError),

    /// Scaler instantiation failed for every trigger (spec.md §7 "Scaler
    /// construction"). Partial per-trigger failures are not modeled as
    /// this variant — they're recorded as a warning condition and
    /// reconciliation continues.
    #[error("no scalers could be built: {0}")]
    Build(#[from] engine_scalers::BuildError),

    /// Job dispatch/classification/GC failed.
    #[error("job engine error: {0}")]
    Job(#[from] engine_jobs::JobError),

    /// Lifecycle event construction failed.
    #[error("event error: {0}")]
    Event(#[from] engine_events::EventError),

    /// The referenced object lacks a namespace the scale subresource needs
    /// (spec.md §4.1 step 1).
    #[error("{0} {1} is missing a namespace")]
    MissingNamespace(&'static str, String),

    /// A `scaleTargetRef.kind` this engine has no typed scale client for.
    #[error("unsupported scale target kind {0:?}")]
    UnsupportedScaleKind(String),
}

/// Result type for controller operations.
pub type Result<T> = std::result::Result<T, ControllerError>;
