//! Eventscale Controller
//!
//! The cluster-side half of the event-driven autoscaling engine: watches
//! `ScalingTarget`, `ScalingJobTarget`, `TriggerAuthentication`,
//! `ClusterTriggerAuthentication`, `EventSink`, and `ClusterEventSink`
//! objects, builds and polls the scaler runtime on their behalf, maintains
//! each `ScalingTarget`'s companion `HorizontalPodAutoscaler`, and drives
//! `ScalingJobTarget` job dispatch.
//!
//! # Architecture
//!
//! One `kube::runtime::controller::Controller` loop per cluster kind, all
//! sharing one [`context::Context`] — the scaler cache, build-time
//! registry, and Prometheus metrics every loop reads and writes. The
//! actual in-range scaling decision for a `ScalingTarget` is made by its
//! companion autoscaler reading the external metric the metrics-api
//! service publishes from the same scaler cache; this process owns the
//! cache's lifecycle and the below-minimum idle/paused overrides the
//! companion autoscaler can't express on its own.
//!
//! # Configuration
//!
//! - `CLUSTER_NAME`: cluster name stamped into emitted CloudEvents.
//! - `LISTEN_ADDR`: address the `/metrics`/`/healthz` server binds (default `0.0.0.0:8080`).
//! - `MAX_CONCURRENT_RECONCILES`: reconciliation concurrency bound (default 10).

pub mod activity;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod events;
pub mod finalizer;
pub mod hpa;
pub mod http;
pub mod metrics;
pub mod reconcile;
pub mod scale;

pub use config::Config;
pub use context::Context;
pub use error::{ControllerError, Result};
