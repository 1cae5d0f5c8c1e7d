//! Clinical emitter service.
//!
//! Renders normalized observations into GDT 2.1 exchange files and
//! tracks per-subject delivery status.

mod config;
mod logging;

use config::Config;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use vitalink_api_clinical::{clinical_router, ClinicalState};

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
        gdt_output = %config.gdt_output_path.display(),
        "Starting clinical-server"
    );

    std::fs::create_dir_all(&config.storage_dir)?;
    let state = match ClinicalState::new(
        &config.storage_dir,
        &config.gdt_output_path,
        &config.gdt_sender_id,
        &config.gdt_receiver_id,
    ) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    let app = clinical_router(state).layer(TraceLayer::new_for_http());
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "clinical-server listening");

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
