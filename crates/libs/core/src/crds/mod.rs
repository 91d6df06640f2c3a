//! The five cluster object kinds declared in spec.md §3.1/§6.

mod event_sink;
mod scaling_job_target;
mod scaling_target;
mod trigger_authentication;

pub use event_sink::{
    ClusterEventSink, ClusterEventSinkSpec, EventDestination, EventSink, EventSinkSpec,
    EventSinkStatus,
};
pub use scaling_job_target::{
    JobRolloutStrategy, ScalingJobTarget, ScalingJobTargetSpec, ScalingJobTargetStatus,
    ScalingStrategy,
};
pub use scaling_target::{ScaleTargetRef, ScalingModifiers, ScalingTarget, ScalingTargetSpec, ScalingTargetStatus};
pub use trigger_authentication::{
    AuthSecretTargetRef, ClusterTriggerAuthentication, ClusterTriggerAuthenticationSpec,
    EnvTargetRef, ExternalSecretStoreRef, PodIdentityProvider, TriggerAuthentication,
    TriggerAuthenticationSpec, TriggerAuthenticationStatus,
};
