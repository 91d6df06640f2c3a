//! `EventSink` and `ClusterEventSink` — lifecycle event destinations
//! (spec.md §3.1, §6).

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One destination lifecycle events are emitted to.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EventDestination {
    /// Deliver as an HTTP POST of a CloudEvents envelope.
    Http {
        /// Destination URL.
        url: String,
    },
    /// Deliver to a cloud event-bus topic.
    CloudEventBus {
        /// Event-bus endpoint/connection string.
        endpoint: String,
        /// Topic name.
        topic: String,
    },
}

impl EventDestination {
    /// A short label identifying this destination for status reporting and
    /// metrics label values.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Http { url } => format!("http:{url}"),
            Self::CloudEventBus { endpoint, topic } => format!("bus:{endpoint}/{topic}"),
        }
    }
}

/// Declares one or more destinations lifecycle events are emitted to.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "EventSink",
    namespaced,
    status = "EventSinkStatus",
    shortname = "es"
)]
#[serde(rename_all = "camelCase")]
pub struct EventSinkSpec {
    /// Destinations events are fanned out to.
    pub destinations: Vec<EventDestination>,
}

/// Per-destination active/inactive flag.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestinationStatus {
    /// Label identifying the destination (see [`EventDestination::label`]).
    pub destination: String,
    /// Whether the destination was last reachable.
    pub active: bool,
}

/// Status of an `EventSink`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventSinkStatus {
    /// Per-destination reachability.
    #[serde(default)]
    pub destinations: Vec<DestinationStatus>,
}

/// Cluster-scoped counterpart of [`EventSinkSpec`].
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "eventscale.example.io",
    version = "v1alpha1",
    kind = "ClusterEventSink",
    status = "EventSinkStatus",
    shortname = "ces"
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEventSinkSpec {
    /// Destinations events are fanned out to.
    pub destinations: Vec<EventDestination>,
}
