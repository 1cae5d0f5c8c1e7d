//! Clinical emitter router and shared state.
//!
//! Routes:
//! - `POST /api/v1/process` - render observations to GDT files
//! - `GET /api/v1/status/:patient_id` - per-subject transfer status
//! - `GET /health` - liveness
//!
//! The emitter trusts its network boundary; the gateway is the only
//! intended caller.

use crate::error::ClinicalError;
use crate::handlers::{process_handler, status_handler};
use crate::services::GdtEmitter;
use crate::store::TransferStatusStore;
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;

/// Application state for the clinical emitter.
#[derive(Clone)]
pub struct ClinicalState {
    /// GDT renderer and exchange-directory writer.
    pub emitter: Arc<GdtEmitter>,
    /// Per-subject transfer status.
    pub status_store: Arc<TransferStatusStore>,
}

impl ClinicalState {
    /// Open the status store and build the emitter.
    ///
    /// # Errors
    ///
    /// Fails when the status store cannot be opened; fatal at startup.
    pub fn new(
        storage_dir: &Path,
        gdt_output_dir: &Path,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<Self, ClinicalError> {
        let status_store = Arc::new(TransferStatusStore::open(
            &storage_dir.join("clinical_status.txt"),
        )?);
        let emitter = Arc::new(GdtEmitter::new(gdt_output_dir, sender_id, receiver_id));
        Ok(Self {
            emitter,
            status_store,
        })
    }
}

/// Build the clinical emitter router.
pub fn clinical_router(state: ClinicalState) -> Router {
    Router::new()
        .route("/api/v1/process", post(process_handler))
        .route("/api/v1/status/:patient_id", get(status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
