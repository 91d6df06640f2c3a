//! Engine Scalers — the runtime that instantiates, caches, polls, and
//! retires the heterogeneous probes that each read one external signal
//! (spec.md §4.2).
//!
//! This crate depends on `engine-core` for the data model but knows
//! nothing about the controller's reconciliation loop or the metrics
//! adapter's HTTP surface; both of those depend on this crate, never the
//! reverse.

pub mod auth;
pub mod build;
pub mod cache;
pub mod composite;
pub mod error;
pub mod fallback;
pub mod poll;
pub mod registry;
pub mod scaler;
pub mod scalers;

pub use build::{build_entry, BuildOutcome, TriggerBuildFailure};
pub use cache::{BuiltScaler, CacheEntry, ScalerCache, TargetKey};
pub use composite::{parse_formula, CompositeScaler, FormulaTerm};
pub use error::{BuildError, PollError, ScalerError};
pub use fallback::FailureTracker;
pub use poll::{poll_target, TargetPoll, DEFAULT_POLL_TIMEOUT};
pub use registry::{GlobalConfig, Registry};
pub use scaler::{MetricSpec, MetricsAndActivity, Sample, Scaler};
