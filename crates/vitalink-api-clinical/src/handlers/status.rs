//! Transfer status handler.

use crate::error::ClinicalError;
use crate::models::StatusResponse;
use crate::router::ClinicalState;
use axum::{
    extract::{Path, State},
    Json,
};

/// Return the subject's running status, or 404 when no transfer was ever
/// recorded.
pub async fn status_handler(
    State(state): State<ClinicalState>,
    Path(patient_id): Path<String>,
) -> Result<Json<StatusResponse>, ClinicalError> {
    let entry = state
        .status_store
        .get(&patient_id)?
        .ok_or_else(|| ClinicalError::StatusNotFound(patient_id.clone()))?;

    Ok(Json(StatusResponse {
        patient_id: entry.patient_id,
        last_transfer: Some(entry.last_transfer),
        transfer_count: entry.transfer_count,
    }))
}
