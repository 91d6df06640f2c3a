//! Eventscale controller service entry point.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engine_controller::context::Context;
use engine_controller::metrics::Metrics;
use engine_controller::Config;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,engine_controller=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if dotenvy::dotenv().is_ok() {
        info!("loaded .env file");
    }

    let config = Config::from_env();
    info!(cluster_name = %config.cluster_name, listen_addr = %config.listen_addr, "starting eventscale controller");

    let client = match kube::Client::try_default().await {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to build Kubernetes client");
            std::process::exit(1);
        }
    };

    let prometheus_registry = Arc::new(prometheus::Registry::new());
    let metrics = match Metrics::register(&prometheus_registry) {
        Ok(metrics) => Arc::new(metrics),
        Err(err) => {
            error!(error = %err, "failed to register Prometheus metrics");
            std::process::exit(1);
        }
    };

    let ctx = Arc::new(Context::new(client, config, metrics, prometheus_registry));
    engine_controller::controller::run(ctx).await;

    info!("eventscale controller stopped");
}
