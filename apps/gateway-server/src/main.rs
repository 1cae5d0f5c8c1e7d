//! Ingestion gateway service.
//!
//! Authenticates submissions against the identity authority's JWKS,
//! enforces rate limits and idempotency, normalizes vendor codings and
//! forwards to the clinical emitter.

mod config;
mod logging;

use config::Config;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitalink_api_gateway::{gateway_router, GatewayOptions, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.log_filter);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        iam = %config.iam_base_url,
        clinical = %config.clinical_base_url,
        rate_limit_max = config.rate_limit_max,
        rate_limit_window_secs = config.rate_limit_window_secs,
        "Starting gateway-server"
    );

    std::fs::create_dir_all(&config.storage_dir)?;
    let state = match GatewayState::new(&GatewayOptions {
        storage_dir: config.storage_dir.clone(),
        jwks_url: config.jwks_url(),
        iam_discovery_url: config.iam_discovery_url(),
        clinical_base_url: config.clinical_base_url.clone(),
        rate_limit_max: config.rate_limit_max,
        rate_limit_window_secs: config.rate_limit_window_secs,
        forward_timeout: config.forward_timeout,
    }) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let app = gateway_router(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "gateway-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
    }
    info!("Shutting down");
}
