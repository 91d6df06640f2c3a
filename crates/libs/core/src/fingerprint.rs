//! Stable configuration fingerprinting — the scaler cache key (spec.md
//! §4.2, §8 "Fingerprint stability").
//!
//! The fingerprint is a stable hash over `(generation, resolved
//! authentication content, trigger list after env substitution)`. Map keys
//! are sorted via `BTreeMap` before hashing, and triggers are hashed in
//! declared order (trigger order is semantically meaningful — it's the
//! "ordered list of triggers" from spec.md §3.1), so two targets with the
//! same triggers in a different order are *not* required to fingerprint
//! equal, only maps-with-reordered-keys are.

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::trigger::Trigger;

/// Resolved authentication content keyed by trigger index, each a sorted
/// map of secret name to value (already-substituted; no references).
pub type ResolvedAuthByTrigger = BTreeMap<usize, BTreeMap<String, String>>;

/// Compute the stable fingerprint of a target's resolved configuration.
#[must_use]
pub fn fingerprint_of(
    generation: i64,
    triggers: &[Trigger],
    resolved_auth: &ResolvedAuthByTrigger,
) -> String {
    let mut hasher = DefaultHasher::new();
    generation.hash(&mut hasher);

    for trigger in triggers {
        trigger.type_.hash(&mut hasher);
        trigger.name.hash(&mut hasher);
        // BTreeMap already iterates in sorted key order.
        for (k, v) in &trigger.metadata {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
        trigger.metric_type.map(|m| format!("{m:?}")).hash(&mut hasher);
        trigger.use_cached_metrics.hash(&mut hasher);
    }

    for (idx, secrets) in resolved_auth {
        idx.hash(&mut hasher);
        for (k, v) in secrets {
            k.hash(&mut hasher);
            v.hash(&mut hasher);
        }
    }

    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    fn trigger_with_metadata(pairs: &[(&str, &str)]) -> Trigger {
        let mut metadata = Map::new();
        for (k, v) in pairs {
            metadata.insert((*k).to_string(), (*v).to_string());
        }
        Trigger {
            type_: "kafka".to_string(),
            name: None,
            metadata,
            authentication_ref: None,
            metric_type: None,
            use_cached_metrics: false,
        }
    }

    #[test]
    fn map_key_order_does_not_affect_fingerprint() {
        let a = trigger_with_metadata(&[("topic", "t1"), ("brokers", "b1")]);
        let b = trigger_with_metadata(&[("brokers", "b1"), ("topic", "t1")]);
        let empty_auth = Map::new();
        assert_eq!(
            fingerprint_of(1, &[a], &empty_auth),
            fingerprint_of(1, &[b], &empty_auth)
        );
    }

    #[test]
    fn semantic_difference_changes_fingerprint() {
        let a = trigger_with_metadata(&[("topic", "t1")]);
        let b = trigger_with_metadata(&[("topic", "t2")]);
        let empty_auth = Map::new();
        assert_ne!(
            fingerprint_of(1, &[a], &empty_auth),
            fingerprint_of(1, &[b], &empty_auth)
        );
    }

    #[test]
    fn generation_bump_changes_fingerprint() {
        let a = trigger_with_metadata(&[("topic", "t1")]);
        let empty_auth = Map::new();
        assert_ne!(
            fingerprint_of(1, &[a.clone()], &empty_auth),
            fingerprint_of(2, &[a], &empty_auth)
        );
    }
}
