//! Status condition helpers shared by every kind's status struct.
//!
//! Grounded on the condition-builder helpers referenced from
//! `reconcilers::backup` in the strimzi backup operator example
//! (`status::conditions::{ready, not_ready, error_conditions}`).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `True` / `False` / `Unknown`, mirroring the cluster's own condition
/// status convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    /// The condition holds.
    True,
    /// The condition does not hold.
    False,
    /// The condition could not be evaluated.
    Unknown,
}

/// One status condition, e.g. `Ready`, `Active`, `Fallback`, `Paused`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    /// Condition name, e.g. `"Ready"`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Current status of the condition.
    pub status: ConditionStatus,
    /// Machine-readable reason for the current status.
    pub reason: String,
    /// Human-readable detail.
    pub message: String,
    /// When the condition last changed status.
    pub last_transition_time: DateTime<Utc>,
}

/// Names of the four well-known condition types carried by `ScalingTarget`
/// and `ScalingJobTarget` status (spec.md §3.1).
pub mod kind {
    /// The target's derived objects exist and scaling can proceed.
    pub const READY: &str = "Ready";
    /// At least one trigger is currently active.
    pub const ACTIVE: &str = "Active";
    /// At least one trigger is in fallback.
    pub const FALLBACK: &str = "Fallback";
    /// The target is frozen at a fixed replica count.
    pub const PAUSED: &str = "Paused";
}

fn condition(type_: &str, status: ConditionStatus, reason: &str, message: &str, now: DateTime<Utc>) -> Condition {
    Condition {
        type_: type_.to_string(),
        status,
        reason: reason.to_string(),
        message: message.to_string(),
        last_transition_time: now,
    }
}

/// Build a `Ready=True` condition.
#[must_use]
pub fn ready(reason: &str, message: &str, now: DateTime<Utc>) -> Condition {
    condition(kind::READY, ConditionStatus::True, reason, message, now)
}

/// Build a `Ready=False` condition.
#[must_use]
pub fn not_ready(reason: &str, message: &str, now: DateTime<Utc>) -> Condition {
    condition(kind::READY, ConditionStatus::False, reason, message, now)
}

/// Build an `Active` condition at the given truth value.
#[must_use]
pub fn active(is_active: bool, now: DateTime<Utc>) -> Condition {
    let status = if is_active { ConditionStatus::True } else { ConditionStatus::False };
    let reason = if is_active { "TriggerActive" } else { "NoActiveTrigger" };
    condition(kind::ACTIVE, status, reason, "", now)
}

/// Build a `Fallback` condition at the given truth value.
#[must_use]
pub fn fallback(is_in_fallback: bool, message: &str, now: DateTime<Utc>) -> Condition {
    let status = if is_in_fallback { ConditionStatus::True } else { ConditionStatus::False };
    let reason = if is_in_fallback { "FailureThresholdExceeded" } else { "NoFailures" };
    condition(kind::FALLBACK, status, reason, message, now)
}

/// Build a `Paused` condition at the given truth value.
#[must_use]
pub fn paused(is_paused: bool, now: DateTime<Utc>) -> Condition {
    let status = if is_paused { ConditionStatus::True } else { ConditionStatus::False };
    let reason = if is_paused { "PausedByAnnotation" } else { "NotPaused" };
    condition(kind::PAUSED, status, reason, "", now)
}
