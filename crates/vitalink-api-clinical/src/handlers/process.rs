//! Observation processing handler.

use crate::error::ClinicalError;
use crate::models::{EntryResult, ProcessRequest, ProcessResponse};
use crate::router::ClinicalState;
use axum::{extract::State, Json};

/// Render each observation to a GDT file and record the transfer.
///
/// Per-entry failures never abort peers; one transfer is recorded for the
/// subject when at least one entry succeeded.
pub async fn process_handler(
    State(state): State<ClinicalState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ClinicalError> {
    if request.patient_id.as_str().trim().is_empty() {
        return Err(ClinicalError::Validation(
            "patientId must not be empty".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(request.observations.len());
    for observation in &request.observations {
        match state.emitter.emit(
            observation,
            request.patient_id.as_str(),
            request.patient_first_name.as_deref(),
            request.patient_last_name.as_deref(),
        ) {
            Ok(processed) => results.push(EntryResult {
                status: "success".to_string(),
                gdt_file_name: Some(processed.gdt_file_name),
                warnings: processed.warnings,
                error: None,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Observation emission failed");
                results.push(EntryResult {
                    status: "error".to_string(),
                    gdt_file_name: None,
                    warnings: Vec::new(),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    let response = ProcessResponse::from_entries(results);
    if response.successful > 0 {
        let status = state.status_store.record_transfer(&request.patient_id)?;
        tracing::info!(
            patient_id = %request.patient_id,
            transfer_count = status.transfer_count,
            written = response.successful,
            "Recorded transfer"
        );
    }

    Ok(Json(response))
}
