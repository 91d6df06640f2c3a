//! Build-time scaler registry (spec.md §9 "Dynamic trigger dispatch").
//!
//! The ~60 trigger types form a closed set at build time; dispatch is a
//! map lookup once per cache-build, never a reflective lookup on the hot
//! (polling) path.

use std::collections::HashMap;
use std::sync::Arc;

use engine_core::Trigger;

use crate::auth::ResolvedAuth;
use crate::error::BuildError;
use crate::scaler::Scaler;
use crate::scalers;

/// Global settings every factory may consult (HTTP client, TLS options).
#[derive(Clone)]
pub struct GlobalConfig {
    /// Shared HTTP client used by every scaler that speaks HTTP.
    pub http: reqwest::Client,
    /// In-cluster API client, for scalers that read cluster objects
    /// (`kubernetes-workload`, `cpu`, `memory`).
    pub kube: kube::Client,
}

/// A factory producing one scaler instance from a trigger declaration and
/// its already-disambiguated published metric name (spec.md §3.2
/// invariant 2 — disambiguation happens once, centrally, before any
/// factory runs; factories never invent their own metric names).
pub type Factory =
    fn(&Trigger, &str, &ResolvedAuth, &GlobalConfig) -> Result<Arc<dyn Scaler>, BuildError>;

/// Maps a trigger type string to its factory function.
pub struct Registry {
    factories: HashMap<&'static str, Factory>,
}

impl Registry {
    /// Build the registry with every scaler type this crate implements
    /// pre-registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut factories: HashMap<&'static str, Factory> = HashMap::new();
        factories.insert("cron", scalers::cron::build);
        factories.insert("prometheus", scalers::prometheus::build);
        factories.insert("kafka", scalers::kafka::build);
        factories.insert("redis-streams", scalers::redis_streams::build);
        factories.insert("aws-sqs-queue", scalers::aws_sqs::build);
        factories.insert("cpu", scalers::cpu::build);
        factories.insert("memory", scalers::memory::build);
        factories.insert("kubernetes-workload", scalers::kubernetes_workload::build);
        factories.insert("external", scalers::external::build_pull);
        factories.insert("external-push", scalers::external::build_push);
        Self { factories }
    }

    /// Register or replace a factory for `trigger_type`. Exposed so hosts
    /// embedding this crate can add scaler types beyond the built-ins
    /// without forking the registry.
    pub fn register(&mut self, trigger_type: &'static str, factory: Factory) {
        self.factories.insert(trigger_type, factory);
    }

    /// Whether `trigger_type` has a registered factory (SPEC_FULL.md §3.2:
    /// "every `Trigger.type` is a known registered scaler type string...
    /// checked against the `engine-scalers` registry at admission time").
    #[must_use]
    pub fn is_known(&self, trigger_type: &str) -> bool {
        self.factories.contains_key(trigger_type)
    }

    /// Build a scaler instance for `trigger`, dispatching to the
    /// registered factory for its `type_`.
    pub fn build(
        &self,
        trigger: &Trigger,
        metric_name: &str,
        auth: &ResolvedAuth,
        global: &GlobalConfig,
    ) -> Result<Arc<dyn Scaler>, BuildError> {
        let factory = self
            .factories
            .get(trigger.type_.as_str())
            .ok_or_else(|| BuildError::UnknownTriggerType(trigger.type_.clone()))?;
        factory(trigger, metric_name, auth, global)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Read a mandatory metadata key from a trigger, mapping absence to the
/// standard [`BuildError::MissingMetadataKey`].
pub fn require<'a>(trigger: &'a Trigger, key: &str) -> Result<&'a str, BuildError> {
    trigger
        .metadata
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| BuildError::MissingMetadataKey {
            scaler_type: trigger.type_.clone(),
            key: key.to_string(),
        })
}

/// Parse a mandatory numeric metadata key.
pub fn require_parsed<T: std::str::FromStr>(trigger: &Trigger, key: &str) -> Result<T, BuildError> {
    let raw = require(trigger, key)?;
    raw.parse().map_err(|_| BuildError::InvalidValue {
        scaler_type: trigger.type_.clone(),
        key: key.to_string(),
        reason: format!("{raw:?} is not a valid number"),
    })
}

/// Parse an optional numeric metadata key, falling back to `default`.
pub fn optional_parsed<T: std::str::FromStr>(trigger: &Trigger, key: &str, default: T) -> Result<T, BuildError> {
    match trigger.metadata.get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| BuildError::InvalidValue {
            scaler_type: trigger.type_.clone(),
            key: key.to_string(),
            reason: format!("{raw:?} is not a valid number"),
        }),
    }
}
