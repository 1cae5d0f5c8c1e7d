//! Patient management handlers.

use crate::error::IamError;
use crate::models::{PatientResponse, RegisterPatientRequest};
use crate::router::IamState;
use crate::store::PatientEntry;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

impl From<PatientEntry> for PatientResponse {
    fn from(entry: PatientEntry) -> Self {
        Self {
            id: entry.id,
            given_name: entry.given_name,
            family_name: entry.family_name,
            date_of_birth: entry.date_of_birth,
            created_at: entry.created_at,
        }
    }
}

/// Register a new patient, assigning the next decimal identifier.
pub async fn register_patient_handler(
    State(state): State<IamState>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<PatientResponse>), IamError> {
    if request.given_name.trim().is_empty() || request.family_name.trim().is_empty() {
        return Err(IamError::InvalidRequest(
            "givenName and familyName must not be empty".to_string(),
        ));
    }
    if chrono::NaiveDate::parse_from_str(&request.date_of_birth, "%Y-%m-%d").is_err() {
        return Err(IamError::InvalidRequest(
            "dateOfBirth must be an ISO calendar date".to_string(),
        ));
    }

    let entry = state.patients.register(
        request.given_name.trim(),
        request.family_name.trim(),
        &request.date_of_birth,
    )?;
    tracing::info!(id = %entry.id, "Registered patient");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// List all registered patients.
pub async fn list_patients_handler(
    State(state): State<IamState>,
) -> Result<Json<Vec<PatientResponse>>, IamError> {
    let patients = state.patients.list()?;
    Ok(Json(patients.into_iter().map(Into::into).collect()))
}

/// Get a patient by identifier.
pub async fn get_patient_handler(
    State(state): State<IamState>,
    Path(id): Path<String>,
) -> Result<Json<PatientResponse>, IamError> {
    let patient = state.patients.get(&id)?.ok_or(IamError::PatientNotFound)?;
    Ok(Json(patient.into()))
}

/// Delete a patient and cascade-revoke every refresh token bound to the
/// subject.
pub async fn delete_patient_handler(
    State(state): State<IamState>,
    Path(id): Path<String>,
) -> Result<StatusCode, IamError> {
    if !state.patients.delete(&id)? {
        return Err(IamError::PatientNotFound);
    }
    let revoked = state.refresh_tokens.revoke_all_for_subject(&id)?;
    tracing::info!(id, revoked, "Deleted patient and revoked outstanding refresh tokens");
    Ok(StatusCode::NO_CONTENT)
}
