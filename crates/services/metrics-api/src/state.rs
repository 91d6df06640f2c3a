//! Application state for the metrics adapter.
//!
//! Mirrors `engine-controller::Context`'s cache/registry/global triple
//! rather than sharing its `Arc`s across a process boundary: this process
//! maintains its own [`ScalerCache`], built and polled on demand as
//! external-metrics requests come in, rather than over IPC from the
//! controller process (see `DESIGN.md` for why "one shared in-process
//! cache, no IPC" is read as "same cache logic", not literal shared memory,
//! once the adapter is its own binary).

use std::sync::Arc;

use engine_scalers::{GlobalConfig, Registry, ScalerCache};
use kube::Client;

use crate::config::Config;

/// Everything a request handler needs.
#[derive(Clone)]
pub struct AppState {
    /// In-cluster API client, used to read `ScalingTarget`/`ScalingJobTarget`
    /// objects and resolve trigger authentication.
    pub client: Client,
    /// Service configuration.
    pub config: Arc<Config>,
    /// This process's own scaler cache.
    pub scalers: Arc<ScalerCache>,
    /// Build-time scaler factory registry.
    pub registry: Arc<Registry>,
    /// HTTP client + kube client bundle the scaler factories consume.
    pub global: GlobalConfig,
    /// Registry backing the `/metrics` route.
    pub prometheus_registry: Arc<prometheus::Registry>,
}

impl AppState {
    /// Build application state for a fresh process.
    #[must_use]
    pub fn new(client: Client, config: Config, prometheus_registry: Arc<prometheus::Registry>) -> Self {
        let http = reqwest::Client::new();
        let global = GlobalConfig { http, kube: client.clone() };
        Self {
            client,
            config: Arc::new(config),
            scalers: Arc::new(ScalerCache::new()),
            registry: Arc::new(Registry::with_builtins()),
            global,
            prometheus_registry,
        }
    }
}
