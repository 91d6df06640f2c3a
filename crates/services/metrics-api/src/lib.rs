//! Eventscale Metrics Adapter
//!
//! Serves the cluster-standard external-metrics API the companion
//! `HorizontalPodAutoscaler` objects read from: for each
//! `{namespace, metricName}` request it resolves the owning `ScalingTarget`,
//! consults (or refreshes) that target's scaler cache entry, applies the
//! paused-target override and fallback policy, and returns the sample.
//!
//! # Architecture
//!
//! Deployed as its own service binary, following the module boundary
//! `engine-controller` also uses — but since a `ScalerCache` cannot be
//! shared across a process boundary without IPC, this process builds and
//! polls its own cache entries on demand rather than reading the
//! controller's in-memory state (see `DESIGN.md`).
//!
//! # Configuration
//!
//! - `HOST`/`PORT`: address the HTTP server binds (default `0.0.0.0:8081`).
//! - `POLL_TIMEOUT_SECS`: bound on a forced fresh poll (default 30).

pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use config::Config;
pub use error::{ApiError, Result};
pub use state::AppState;
