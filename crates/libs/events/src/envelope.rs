//! Lifecycle event envelope construction (spec.md §6: "lifecycle events are
//! formatted as standard CloudEvents envelopes with source
//! `/cluster/{clusterName}/keda`, subject
//! `/cluster/{clusterName}/{namespace}/{kind}/{name}`, and a typed body").

use cloudevents::{AttributesReader, Event, EventBuilder, EventBuilderV10};
use serde::Serialize;

use crate::error::EventError;

/// The kind of lifecycle occurrence being reported. The `ty()` string on
/// the wire is this variant's `as_str()`, namespaced under
/// `io.example.eventscale.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A target was created.
    Created,
    /// A target's spec changed.
    Updated,
    /// A target was deleted.
    Deleted,
    /// A scaling decision was made (replica count changed).
    ScalingDecision,
    /// A reconcile or poll error occurred.
    Error,
}

impl EventKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "io.example.eventscale.target.created",
            Self::Updated => "io.example.eventscale.target.updated",
            Self::Deleted => "io.example.eventscale.target.deleted",
            Self::ScalingDecision => "io.example.eventscale.scaling.decision",
            Self::Error => "io.example.eventscale.error",
        }
    }
}

/// Everything needed to address and label one lifecycle event.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// Name of the cluster this engine instance runs in, used in `source`
    /// and `subject`.
    pub cluster_name: String,
    /// Namespace of the resource the event concerns (empty for
    /// cluster-scoped kinds).
    pub namespace: String,
    /// Kind of the resource the event concerns, e.g. `ScalingTarget`.
    pub kind: String,
    /// Name of the resource the event concerns.
    pub name: String,
}

impl EventContext {
    fn source(&self) -> String {
        format!("/cluster/{}/keda", self.cluster_name)
    }

    fn subject(&self) -> String {
        format!("/cluster/{}/{}/{}/{}", self.cluster_name, self.namespace, self.kind, self.name)
    }
}

/// Build a CloudEvents v1.0 envelope carrying `payload` as its `data`.
///
/// # Errors
/// Returns [`EventError::Envelope`] if the builder rejects the supplied
/// attributes (only possible if `context` fields contain characters the
/// CloudEvents URI-reference attributes reject), or
/// [`EventError::Serialize`] if `payload` fails to serialize.
pub fn build_event<T: Serialize>(kind: EventKind, context: &EventContext, payload: &T) -> Result<Event, EventError> {
    let data = serde_json::to_value(payload)?;
    let event = EventBuilderV10::new()
        .id(uuid::Uuid::new_v4().to_string())
        .source(context.source())
        .subject(context.subject())
        .ty(kind.as_str())
        .time(chrono::Utc::now())
        .data("application/json", data)
        .build()?;
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_has_expected_source_and_subject() {
        let context = EventContext {
            cluster_name: "prod".to_string(),
            namespace: "payments".to_string(),
            kind: "ScalingTarget".to_string(),
            name: "checkout-worker".to_string(),
        };
        let event = build_event(EventKind::ScalingDecision, &context, &json!({"replicas": 4})).unwrap();
        assert_eq!(event.source().to_string(), "/cluster/prod/keda");
        assert_eq!(event.subject(), Some("/cluster/prod/payments/ScalingTarget/checkout-worker"));
        assert_eq!(event.ty(), "io.example.eventscale.scaling.decision");
    }
}
