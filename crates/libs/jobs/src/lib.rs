//! Engine Jobs — the dispatch engine behind `ScalingJobTarget` (spec.md
//! §4.4): classifying in-flight `batch/v1` `Job`s, computing how many new
//! ones a tick should create, stamping and creating them, pruning history,
//! and handling rollout of in-flight jobs on a spec change.
//!
//! Depends only on `engine-core`; the controller crate wires this together
//! with `engine-scalers`' polled metrics to drive the actual reconcile
//! loop.

pub mod classify;
pub mod dispatch;
pub mod error;
pub mod gc;
pub mod rollout;
pub mod strategy;

pub use classify::{classify, JobState};
pub use dispatch::{build_job, dispatch, list_owned, owned_label_selector};
pub use error::JobError;
pub use gc::collect as collect_garbage;
pub use rollout::reconcile_rollout;
pub use strategy::{jobs_to_dispatch, StrategyInput};
