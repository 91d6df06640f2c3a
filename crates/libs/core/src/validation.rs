//! Structural validation of the data model (spec.md §3.2, §4.1 step 1,
//! §9 Open Question). These are the "contracts on the data model" spec.md
//! §1 says stand in for admission webhook HTTP handlers: pure functions,
//! no HTTP surface.

use thiserror::Error;

use crate::crds::{ScalingJobTargetSpec, ScalingTargetSpec};

/// Validation failures, surfaced by the controller as `Ready=False` with a
/// structured reason (spec.md §7).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// `maxReplicas < minReplicas`.
    #[error("maxReplicas ({max}) must be >= minReplicas ({min})")]
    MaxBelowMin {
        /// Declared `minReplicas`.
        min: i32,
        /// Declared `maxReplicas`.
        max: i32,
    },

    /// `minReplicas < 0`.
    #[error("minReplicas must be >= 0, got {0}")]
    NegativeMinReplicas(i32),

    /// `idleReplicas` set while `minReplicas == 0`.
    #[error("idleReplicas is set but minReplicas is 0")]
    IdleReplicasWithoutMinReplicas,

    /// `idleReplicas >= minReplicas` — spec.md §9 Open Question, resolved as
    /// a hard validation error rather than silent coercion.
    #[error("idleReplicas ({idle}) must be strictly less than minReplicas ({min})")]
    IdleNotBelowMin {
        /// Declared `idleReplicas`.
        idle: i32,
        /// Declared `minReplicas`.
        min: i32,
    },

    /// No triggers declared.
    #[error("at least one trigger is required")]
    NoTriggers,

    /// `failureThreshold < 1` on a declared fallback policy.
    #[error("fallback.failureThreshold must be >= 1, got {0}")]
    NonPositiveFailureThreshold(u32),

    /// `maxReplicaCount < 1` on a `ScalingJobTarget`.
    #[error("maxReplicaCount must be >= 1, got {0}")]
    NonPositiveMaxReplicaCount(i32),
}

impl ScalingTargetSpec {
    /// Validate the invariants in spec.md §3.2 plus the supplementary
    /// structural checks in SPEC_FULL.md §3.2.
    ///
    /// # Errors
    /// Returns the first invariant violated, in the order checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_replicas < 0 {
            return Err(ValidationError::NegativeMinReplicas(self.min_replicas));
        }
        if self.max_replicas < self.min_replicas {
            return Err(ValidationError::MaxBelowMin {
                min: self.min_replicas,
                max: self.max_replicas,
            });
        }
        if let Some(idle) = self.idle_replicas {
            if self.min_replicas == 0 {
                return Err(ValidationError::IdleReplicasWithoutMinReplicas);
            }
            if idle >= self.min_replicas {
                return Err(ValidationError::IdleNotBelowMin {
                    idle,
                    min: self.min_replicas,
                });
            }
        }
        if self.triggers.is_empty() {
            return Err(ValidationError::NoTriggers);
        }
        if let Some(fb) = &self.fallback {
            if fb.failure_threshold < 1 {
                return Err(ValidationError::NonPositiveFailureThreshold(fb.failure_threshold));
            }
        }
        Ok(())
    }
}

impl ScalingJobTargetSpec {
    /// Validate the invariants applicable to `ScalingJobTarget`.
    ///
    /// # Errors
    /// Returns the first invariant violated, in the order checked.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.triggers.is_empty() {
            return Err(ValidationError::NoTriggers);
        }
        if self.max_replica_count < 1 {
            return Err(ValidationError::NonPositiveMaxReplicaCount(self.max_replica_count));
        }
        if let Some(fb) = &self.fallback {
            if fb.failure_threshold < 1 {
                return Err(ValidationError::NonPositiveFailureThreshold(fb.failure_threshold));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crds::ScaleTargetRef;
    use crate::trigger::Trigger;
    use std::collections::BTreeMap;

    fn base_spec() -> ScalingTargetSpec {
        ScalingTargetSpec {
            scale_target_ref: ScaleTargetRef {
                api_version: "apps/v1".to_string(),
                kind: "Deployment".to_string(),
                name: "web".to_string(),
            },
            min_replicas: 1,
            max_replicas: 10,
            idle_replicas: None,
            cooldown_period: 300,
            polling_interval: 30,
            triggers: vec![Trigger {
                type_: "cron".to_string(),
                name: None,
                metadata: BTreeMap::new(),
                authentication_ref: None,
                metric_type: None,
                use_cached_metrics: false,
            }],
            fallback: None,
            restore_to_original_replica_count: false,
                scaling_modifiers: None,
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(base_spec().validate().is_ok());
    }

    #[test]
    fn max_below_min_rejected() {
        let mut s = base_spec();
        s.max_replicas = 0;
        assert_eq!(
            s.validate(),
            Err(ValidationError::MaxBelowMin { min: 1, max: 0 })
        );
    }

    #[test]
    fn idle_equal_to_min_is_rejected() {
        let mut s = base_spec();
        s.idle_replicas = Some(1);
        assert_eq!(
            s.validate(),
            Err(ValidationError::IdleNotBelowMin { idle: 1, min: 1 })
        );
    }

    #[test]
    fn idle_below_min_is_accepted() {
        let mut s = base_spec();
        s.idle_replicas = Some(0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn idle_without_min_replicas_rejected() {
        let mut s = base_spec();
        s.min_replicas = 0;
        s.max_replicas = 10;
        s.idle_replicas = Some(0);
        assert_eq!(s.validate(), Err(ValidationError::IdleReplicasWithoutMinReplicas));
    }

    #[test]
    fn empty_triggers_rejected() {
        let mut s = base_spec();
        s.triggers.clear();
        assert_eq!(s.validate(), Err(ValidationError::NoTriggers));
    }
}
