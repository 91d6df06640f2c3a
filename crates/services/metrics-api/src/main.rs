//! Eventscale metrics adapter service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use engine_metrics_api::api::create_router;
use engine_metrics_api::{AppState, Config};

#[tokio::main]
async fn main() {
    if dotenvy::dotenv().is_ok() {
        info!("loaded .env file");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,engine_metrics_api=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let addr = config.socket_addr();

    let client = match kube::Client::try_default().await {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "failed to build Kubernetes client");
            std::process::exit(1);
        }
    };

    let prometheus_registry = Arc::new(prometheus::Registry::new());
    let state = AppState::new(client, config, prometheus_registry);
    let app = create_router(state);

    let socket_addr: SocketAddr = addr.parse().expect("invalid socket address");
    info!(addr = %socket_addr, "starting eventscale metrics adapter");

    let listener = tokio::net::TcpListener::bind(socket_addr).await.expect("failed to bind to address");
    axum::serve(listener, app).await.expect("server error");
}
