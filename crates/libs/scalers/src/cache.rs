//! The process-wide scaler cache (spec.md §4.2 "Cache").
//!
//! Maps `fingerprint(target) -> {scalers, recorder}`. Shared, read-mostly,
//! read by both the metrics adapter and the controllers; a read is
//! lock-free under the common case (an `RwLock` read guard), cache updates
//! take a short write lock. Entries are immutable after publication —
//! invalidation replaces the whole entry rather than mutating it in place.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use engine_core::Trigger;

use crate::fallback::FailureTracker;
use crate::scaler::{MetricSpec, Scaler};

/// A key identifying one target in the cache: `(namespace, name)`, kind-
/// prefixed so `ScalingTarget` and `ScalingJobTarget` never collide even if
/// a user reuses a name across kinds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetKey {
    /// `"ScalingTarget"` or `"ScalingJobTarget"`.
    pub kind: &'static str,
    /// Namespace of the owning target.
    pub namespace: String,
    /// Name of the owning target.
    pub name: String,
}

impl TargetKey {
    /// Build a key for a `ScalingTarget`.
    #[must_use]
    pub fn scaling_target(namespace: &str, name: &str) -> Self {
        Self { kind: "ScalingTarget", namespace: namespace.to_string(), name: name.to_string() }
    }

    /// Build a key for a `ScalingJobTarget`.
    #[must_use]
    pub fn scaling_job_target(namespace: &str, name: &str) -> Self {
        Self { kind: "ScalingJobTarget", namespace: namespace.to_string(), name: name.to_string() }
    }
}

/// One built scaler alongside the trigger it came from and its
/// disambiguated metric name.
pub struct BuiltScaler {
    /// Index into the target's trigger list.
    pub trigger_index: usize,
    /// Disambiguated published metric name for this trigger.
    pub metric_name: String,
    /// The trigger declaration this scaler was built from.
    pub trigger: Trigger,
    /// The live scaler instance.
    pub scaler: Arc<dyn Scaler>,
}

/// One published cache entry: immutable once built.
pub struct CacheEntry {
    /// Fingerprint this entry was built from (spec.md §8 "Fingerprint
    /// stability").
    pub fingerprint: String,
    /// One built scaler per trigger that built successfully (spec.md §4.1
    /// "Partial failures": a trigger that failed to build is simply absent
    /// here, not a cache-build failure).
    pub scalers: Vec<BuiltScaler>,
    /// Consecutive-failure counters, shared across every poll of this
    /// entry's lifetime.
    pub failures: Arc<std::sync::Mutex<FailureTracker>>,
    /// Last-known samples per metric name, for `useCachedMetrics=true`
    /// reads and for the metrics adapter's fallback path.
    pub last_known: Arc<std::sync::Mutex<BTreeMap<String, (f64, bool)>>>,
}

/// The shared cache itself.
#[derive(Default)]
pub struct ScalerCache {
    entries: RwLock<BTreeMap<TargetKey, Arc<CacheEntry>>>,
}

impl ScalerCache {
    /// Construct an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the current entry for `key`, if one has been published.
    #[must_use]
    pub fn get(&self, key: &TargetKey) -> Option<Arc<CacheEntry>> {
        self.entries.read().expect("scaler cache lock poisoned").get(key).cloned()
    }

    /// Whether a published entry exists and its fingerprint matches
    /// `fingerprint` (i.e. no rebuild is needed).
    #[must_use]
    pub fn is_current(&self, key: &TargetKey, fingerprint: &str) -> bool {
        self.get(key).is_some_and(|e| e.fingerprint == fingerprint)
    }

    /// Publish (or replace) the entry for `key`.
    pub fn publish(&self, key: TargetKey, entry: CacheEntry) {
        self.entries
            .write()
            .expect("scaler cache lock poisoned")
            .insert(key, Arc::new(entry));
    }

    /// Remove `key`'s entry, e.g. on target deletion (invariant 5: no
    /// scaler instance survives its owning target).
    #[must_use]
    pub fn remove(&self, key: &TargetKey) -> Option<Arc<CacheEntry>> {
        self.entries.write().expect("scaler cache lock poisoned").remove(key)
    }

    /// All currently-cached keys, e.g. for the metrics adapter's staleness
    /// sweep.
    #[must_use]
    pub fn keys(&self) -> Vec<TargetKey> {
        self.entries.read().expect("scaler cache lock poisoned").keys().cloned().collect()
    }

    /// Metric specs published by the given target, flattened across its
    /// scalers. Empty if the target has no cache entry.
    #[must_use]
    pub fn metric_specs(&self, key: &TargetKey) -> Vec<MetricSpec> {
        self.get(key)
            .map(|entry| entry.scalers.iter().flat_map(|b| b.scaler.metric_spec()).collect())
            .unwrap_or_default()
    }
}
