//! Configuration for the metrics adapter service.

use std::env;

/// Runtime configuration for the external-metrics adapter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Bound applied to each scaler call issued while serving a request
    /// (spec.md §5, §4.2: "default 30s, configurable").
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a set environment variable fails to parse.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "8081".to_string()).parse().expect("PORT must be a valid number"),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string()).parse().expect("POLL_TIMEOUT_SECS must be a valid number"),
        }
    }

    /// Returns the socket address to bind to.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
