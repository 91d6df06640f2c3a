//! Engine Core — data model for the event-driven autoscaling engine.
//!
//! This crate owns the five cluster-facing custom resource kinds
//! (`ScalingTarget`, `ScalingJobTarget`, `TriggerAuthentication`,
//! `ClusterTriggerAuthentication`, `EventSink`, `ClusterEventSink`), the
//! `Trigger` sub-document they share, the fallback policy, condition
//! helpers, structural validation, and the configuration fingerprint used
//! by the scaler cache.
//!
//! It has no dependency on the scaler runtime, the controller, or the
//! metrics API — those crates depend on this one, never the reverse.

pub mod conditions;
pub mod crds;
pub mod fallback;
pub mod fingerprint;
pub mod trigger;
pub mod validation;

pub use conditions::{Condition, ConditionStatus};
pub use crds::{
    ClusterEventSink, ClusterEventSinkSpec, ClusterTriggerAuthentication,
    ClusterTriggerAuthenticationSpec, EventSink, EventSinkSpec, EventSinkStatus,
    ScalingJobTarget, ScalingJobTargetSpec, ScalingJobTargetStatus, ScalingModifiers,
    ScalingTarget, ScalingTargetSpec, ScalingTargetStatus, TriggerAuthentication,
    TriggerAuthenticationSpec, TriggerAuthenticationStatus,
};
pub use fallback::{FallbackBehavior, FallbackPolicy, FallbackScope};
pub use fingerprint::fingerprint_of;
pub use trigger::{MetricType, Trigger};
pub use validation::ValidationError;

/// The API group shared by every kind this crate declares.
pub const API_GROUP: &str = "eventscale.example.io";

/// The API version shared by every kind this crate declares.
pub const API_VERSION: &str = "v1alpha1";
