//! Configuration for the `eventscale` controller service.

use std::env;

/// Configuration for the controller process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cluster name used in emitted CloudEvents' `source`/`subject`
    /// attributes (spec.md §6).
    pub cluster_name: String,
    /// Address the `/metrics` and `/healthz` HTTP server binds.
    pub listen_addr: String,
    /// Upper bound on reconciliations running in parallel across distinct
    /// objects (spec.md §5 `maxConcurrentReconciles`).
    pub max_concurrent_reconciles: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if `MAX_CONCURRENT_RECONCILES` is set but not a valid
    /// integer.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cluster_name: env::var("CLUSTER_NAME").unwrap_or_else(|_| "default".to_string()),
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            max_concurrent_reconciles: env::var("MAX_CONCURRENT_RECONCILES")
                .ok()
                .map(|v| v.parse().expect("MAX_CONCURRENT_RECONCILES must be a valid integer"))
                .unwrap_or(10),
        }
    }
}
