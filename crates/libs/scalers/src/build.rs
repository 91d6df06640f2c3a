//! Cache-entry construction: resolve authentication and build one scaler
//! per trigger, tolerating partial failures (spec.md §4.1 "Partial
//! failures: one trigger of several fails to build... mark only the
//! offending trigger and continue with the rest").

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use engine_core::fingerprint::ResolvedAuthByTrigger;
use engine_core::Trigger;
use kube::Client;
use tracing::warn;

use crate::auth::{self, ExternalSecretStore, ResolvedAuth};
use crate::cache::{BuiltScaler, CacheEntry};
use crate::error::BuildError;
use crate::fallback::FailureTracker;
use crate::registry::{GlobalConfig, Registry};
use engine_core::trigger::disambiguate_metric_names;

/// One trigger that failed to build, recorded for the caller to surface as
/// a per-trigger warning condition rather than failing the whole target.
#[derive(Debug, Clone)]
pub struct TriggerBuildFailure {
    /// Index of the offending trigger.
    pub trigger_index: usize,
    /// Why it failed.
    pub error: String,
}

/// Result of building a target's full cache entry.
pub struct BuildOutcome {
    /// The entry to publish, if at least the fingerprint was computable.
    /// Always `Some` — a target with zero successfully-built triggers still
    /// publishes an entry with an empty `scalers` list, so the target stays
    /// `Ready=True` with a warning condition per spec.md §4.1 rather than
    /// erroring outright.
    pub entry: CacheEntry,
    /// Per-trigger build failures, in trigger order.
    pub failures: Vec<TriggerBuildFailure>,
}

/// Resolve authentication for every trigger, build a scaler for each, and
/// assemble the fingerprint + cache entry.
pub async fn build_entry(
    client: &Client,
    namespace: &str,
    generation: i64,
    triggers: &[Trigger],
    global: &GlobalConfig,
    store: &dyn ExternalSecretStore,
    registry: &Registry,
) -> BuildOutcome {
    let metric_names = disambiguate_metric_names(triggers);
    let mut resolved_auth: ResolvedAuthByTrigger = BTreeMap::new();
    let mut scalers = Vec::new();
    let mut failures = Vec::new();

    for (idx, trigger) in triggers.iter().enumerate() {
        let resolved = match auth::resolve(client, namespace, trigger.authentication_ref.as_ref(), store).await {
            Ok(resolved) => resolved,
            Err(err) => {
                warn!(trigger_index = idx, error = %err, "trigger authentication resolution failed");
                failures.push(TriggerBuildFailure { trigger_index: idx, error: err.to_string() });
                continue;
            }
        };
        resolved_auth.insert(idx, resolved.secrets.clone());

        match build_one(trigger, &metric_names[idx], &resolved, global, registry) {
            Ok(scaler) => scalers.push(BuiltScaler {
                trigger_index: idx,
                metric_name: metric_names[idx].clone(),
                trigger: trigger.clone(),
                scaler,
            }),
            Err(err) => {
                warn!(trigger_index = idx, trigger_type = %trigger.type_, error = %err, "scaler construction failed");
                failures.push(TriggerBuildFailure { trigger_index: idx, error: err.to_string() });
            }
        }
    }

    let fingerprint = engine_core::fingerprint_of(generation, triggers, &resolved_auth);

    BuildOutcome {
        entry: CacheEntry {
            fingerprint,
            scalers,
            failures: Arc::new(Mutex::new(FailureTracker::default())),
            last_known: Arc::new(Mutex::new(BTreeMap::new())),
        },
        failures,
    }
}

fn build_one(
    trigger: &Trigger,
    metric_name: &str,
    auth: &ResolvedAuth,
    global: &GlobalConfig,
    registry: &Registry,
) -> Result<Arc<dyn crate::scaler::Scaler>, BuildError> {
    registry.build(trigger, metric_name, auth, global)
}
