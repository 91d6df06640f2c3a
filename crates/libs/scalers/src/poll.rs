//! The per-target polling loop (spec.md §4.2 "Polling loop", §5
//! "Cancellation and timeouts").

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use crate::cache::CacheEntry;
use crate::composite::{parse_formula, CompositeScaler};
use crate::error::PollError;
use crate::fallback::{self, FallbackOutcome};
use crate::scaler::Sample;

/// Default bound on a single scaler call within one poll (spec.md §4.2,
/// §5: "default 30s, configurable").
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// The outcome of polling every scaler in one target's cache entry once.
#[derive(Debug, Clone)]
pub struct TargetPoll {
    /// Fallback-adjusted samples, ready for the metrics adapter.
    pub samples: Vec<Sample>,
    /// Whether any trigger (post-fallback) reports active, or the raw
    /// activation-threshold crossing (spec.md §4.1: "active iff at least
    /// one trigger reports active=true OR at least one trigger's current
    /// metric value exceeds its activationThreshold").
    pub active: bool,
    /// Whether the target is currently in fallback.
    pub in_fallback: bool,
}

/// Poll every scaler in `entry` in parallel, bounded by `timeout` each,
/// apply the fallback policy, and update the entry's last-known-value
/// cache.
///
/// `current_replicas` feeds `currentReplicas*` fallback behaviors.
/// `scaling_modifiers`, when set, replaces the fallback-adjusted
/// per-trigger samples with a single composite sample computed from its
/// `??`-coalesce formula (spec.md §4.2 "Composite/meta scalers": "the
/// composite value replaces the per-trigger metrics the autoscaler sees").
pub async fn poll_target(
    entry: &CacheEntry,
    fallback_policy: Option<&engine_core::FallbackPolicy>,
    current_replicas: i32,
    timeout: Duration,
    scaling_modifiers: Option<&engine_core::ScalingModifiers>,
) -> TargetPoll {
    let calls = entry.scalers.iter().map(|built| {
        let scaler = Arc::clone(&built.scaler);
        async move { tokio::time::timeout(timeout, scaler.get_metrics_and_activity()).await }
    });

    let results = join_all(calls).await;

    let mut raw_by_trigger: BTreeMap<usize, Vec<Sample>> = BTreeMap::new();
    let mut raw_active = false;

    {
        let mut tracker = entry.failures.lock().expect("failure tracker lock poisoned");
        for (built, result) in entry.scalers.iter().zip(results) {
            match result {
                Ok(Ok(metrics)) => {
                    tracker.record_success(built.trigger_index);
                    if metrics.active {
                        raw_active = true;
                    }
                    raw_by_trigger.insert(built.trigger_index, metrics.samples);
                }
                Ok(Err(err)) => {
                    warn!(trigger = %built.trigger.type_, metric = %built.metric_name, error = %err, "scaler poll failed");
                    tracker.record_failure(built.trigger_index);
                }
                Err(_elapsed) => {
                    warn!(trigger = %built.trigger.type_, metric = %built.metric_name, error = %PollError::Timeout, "scaler poll timed out");
                    tracker.record_failure(built.trigger_index);
                }
            }
        }
    }

    let names_by_trigger: BTreeMap<usize, String> =
        entry.scalers.iter().map(|built| (built.trigger_index, built.metric_name.clone())).collect();

    let tracker = entry.failures.lock().expect("failure tracker lock poisoned").clone();
    let FallbackOutcome { samples, in_fallback } = fallback::apply(
        fallback_policy,
        &tracker,
        &raw_by_trigger,
        &names_by_trigger,
        entry.scalers.len(),
        current_replicas,
    );

    let activation_active = entry.scalers.iter().any(|built| {
        let spec_targets: Vec<_> = built.scaler.metric_spec();
        raw_by_trigger.get(&built.trigger_index).is_some_and(|raw| {
            raw.iter().any(|sample| {
                spec_targets
                    .iter()
                    .find(|s| s.name == sample.name)
                    .is_some_and(|spec| sample.value > spec.target_value)
            })
        })
    });

    let active = raw_active || activation_active;

    let samples = if let Some(modifiers) = scaling_modifiers {
        let available: BTreeMap<String, f64> = samples.iter().map(|s| (s.name.clone(), s.value)).collect();
        let composite = CompositeScaler {
            formula: parse_formula(&modifiers.formula),
            target: modifiers.target,
            metric_name: modifiers.metric_name.clone(),
        };
        vec![Sample { name: modifiers.metric_name.clone(), value: composite.evaluate(&available) }]
    } else {
        samples
    };

    {
        let mut last_known = entry.last_known.lock().expect("last-known lock poisoned");
        for sample in &samples {
            last_known.insert(sample.name.clone(), (sample.value, active));
        }
    }

    TargetPoll { samples, active, in_fallback }
}
