//! Per-kind reconciliation (spec.md §4.1). Each submodule owns one cluster
//! kind's `reconcile`/`error_policy` pair, wired together in
//! `crate::controller`.

pub mod event_sink;
pub mod scaling_job_target;
pub mod scaling_target;
pub mod trigger_authentication;

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use kube::ResourceExt;
use tracing::error;

use crate::context::Context;
use crate::error::ControllerError;

/// Shared error policy: log, requeue with backoff. spec.md §5 doesn't
/// mandate a particular backoff; 30s mirrors the scaler poll timeout so a
/// transient API hiccup doesn't starve a target for multiple polling
/// intervals.
pub fn error_policy<K: ResourceExt>(obj: Arc<K>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    error!(name = %obj.name_any(), namespace = ?obj.namespace(), %error, "reconcile failed");
    Action::requeue(Duration::from_secs(30))
}
