//! Error taxonomy for the scaler runtime (spec.md §7: *Scaler construction*,
//! *Authentication resolution*, *Transient I/O*).

use thiserror::Error;

/// Errors raised while building a scaler instance from a trigger
/// declaration, or while resolving its authentication.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A mandatory metadata key was not supplied.
    #[error("trigger type {scaler_type} requires metadata key {key:?}")]
    MissingMetadataKey {
        /// The scaler type being built.
        scaler_type: String,
        /// The missing key.
        key: String,
    },

    /// A metadata value could not be parsed as the expected type, or fell
    /// outside a valid range.
    #[error("trigger type {scaler_type} has invalid value for {key:?}: {reason}")]
    InvalidValue {
        /// The scaler type being built.
        scaler_type: String,
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Two or more options conflict, or a combination of options is
    /// unsupported.
    #[error("trigger type {scaler_type} has inconsistent options: {reason}")]
    InconsistentOptions {
        /// The scaler type being built.
        scaler_type: String,
        /// What is inconsistent.
        reason: String,
    },

    /// No factory is registered for this trigger type string.
    #[error("unknown trigger type {0:?}")]
    UnknownTriggerType(String),

    /// Authentication could not be resolved (missing secret, env var,
    /// identity binding).
    #[error("authentication resolution failed: {0}")]
    AuthenticationResolution(String),
}

/// Errors raised while polling a built scaler for metrics/activity.
#[derive(Debug, Error)]
pub enum PollError {
    /// The underlying HTTP call failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The underlying cluster API call failed.
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    /// The poll exceeded its configured timeout.
    #[error("poll timed out")]
    Timeout,

    /// The remote returned a value this scaler couldn't interpret (e.g. a
    /// null where `ignoreNullValues=false`, or a non-numeric scalar).
    #[error("{0}")]
    BadResponse(String),
}

/// Umbrella error for anything the scaler runtime can raise.
#[derive(Debug, Error)]
pub enum ScalerError {
    /// See [`BuildError`].
    #[error(transparent)]
    Build(#[from] BuildError),
    /// See [`PollError`].
    #[error(transparent)]
    Poll(#[from] PollError),
}
