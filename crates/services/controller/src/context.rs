//! Shared reconciler context (spec.md §5: "the scaler cache is a read-mostly
//! map... shared by the metrics adapter and the controllers").

use std::collections::HashMap;
use std::sync::Arc;

use engine_events::{Emitter, EmitterMetrics, HttpDeliverer};
use engine_scalers::{GlobalConfig, Registry, ScalerCache, TargetKey};
use kube::Client;
use tokio::sync::{Mutex, Semaphore};

use crate::activity::ActivityState;
use crate::config::Config;
use crate::metrics::Metrics;

/// Everything a reconciler needs, shared across every target this process
/// manages.
///
/// spec.md §5 describes each target as owning "one long-lived polling
/// coroutine"; here that coroutine is the reconciler's own requeue loop
/// (`Action::requeue(pollingInterval)`, see
/// `reconcile::scaling_target::reconcile`) rather than a detached task, so
/// cancellation (spec.md §3.2 invariant 5) is just dropping the cache and
/// activity entries on finalization — there is no separate task handle to
/// abort.
pub struct Context {
    /// In-cluster API client.
    pub client: Client,
    /// Process configuration.
    pub config: Config,
    /// Shared scaler cache (spec.md §4.2 "Cache").
    pub scalers: Arc<ScalerCache>,
    /// Build-time scaler factory registry.
    pub registry: Registry,
    /// HTTP client + kube client bundle the scaler factories consume.
    pub global: GlobalConfig,
    /// Prometheus metrics.
    pub metrics: Arc<Metrics>,
    /// Registry backing `metrics`, scraped by the `/metrics` route.
    pub prometheus_registry: Arc<prometheus::Registry>,
    /// Activity/cooldown state per `ScalingTarget` (spec.md §4.1 "Activity
    /// and idle transitions").
    pub activity: Mutex<HashMap<TargetKey, ActivityState>>,
    /// Bounded lifecycle event queue (spec.md §6 "Event emission").
    pub events: Arc<Emitter>,
    /// Delivery-outcome counters for `events`.
    pub event_metrics: Arc<EmitterMetrics>,
    /// Bounds reconciliations running in parallel across distinct
    /// `ScalingTarget`/`ScalingJobTarget` objects to
    /// `config.max_concurrent_reconciles` (spec.md §5).
    pub reconcile_semaphore: Arc<Semaphore>,
}

impl Context {
    /// Build the shared context.
    ///
    /// # Panics
    /// Panics if the lifecycle-event delivery counter fails to register
    /// against `prometheus_registry` (only possible on a duplicate metric
    /// name, which would itself be a startup bug).
    #[must_use]
    pub fn new(client: Client, config: Config, metrics: Arc<Metrics>, prometheus_registry: Arc<prometheus::Registry>) -> Self {
        let http = reqwest::Client::new();
        let global = GlobalConfig { http: http.clone(), kube: client.clone() };
        let event_metrics = Arc::new(EmitterMetrics::register(&prometheus_registry).expect("register lifecycle event metrics"));
        let events = Arc::new(Emitter::spawn(Arc::new(HttpDeliverer::new(http)), Arc::clone(&event_metrics)));
        let reconcile_semaphore = Arc::new(Semaphore::new(config.max_concurrent_reconciles.max(1) as usize));
        Self {
            client,
            config,
            scalers: Arc::new(ScalerCache::new()),
            registry: Registry::with_builtins(),
            global,
            metrics,
            prometheus_registry,
            activity: Mutex::new(HashMap::new()),
            events,
            event_metrics,
            reconcile_semaphore,
        }
    }

    /// Drop the cache entry and activity state for `key` (spec.md §3.2
    /// invariant 5: "no scaler instance survives its owning target").
    pub async fn cancel_poll_task(&self, key: &TargetKey) {
        self.activity.lock().await.remove(key);
        self.scalers.remove(key);
    }
}
