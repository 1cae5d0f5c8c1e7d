//! Identity authority service.
//!
//! OAuth 2.0 Authorization Code + PKCE provider with OIDC discovery,
//! JWKS publication, refresh-token rotation and patient management.

mod config;
mod logging;

use config::Config;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitalink_api_iam::{iam_router, ClientRegistry, IamState};

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
        storage_dir = %config.storage_dir.display(),
        "Starting iam-server"
    );

    std::fs::create_dir_all(&config.storage_dir)?;
    let clients = ClientRegistry::new(&config.client_id, config.redirect_uris.clone());
    let state = match IamState::new(&config.storage_dir, config.base_url.clone(), clients) {
        Ok(state) => state,
        Err(e) => {
            // Key or store load failure at startup is fatal.
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let app = iam_router(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "iam-server listening");

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
