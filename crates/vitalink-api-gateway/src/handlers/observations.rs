//! Observation submission handler.

use crate::context::AuthContext;
use crate::error::GatewayError;
use crate::router::GatewayState;
use crate::services::handle_submission;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use vitalink_fhir::Bundle;

/// Submit a FHIR bundle of observations.
///
/// Requires an `Idempotency-Key` header. A fresh submission answers 201
/// with the canonical result; replaying the same `(key, subject)` answers
/// 200 with the byte-identical prior body.
pub async fn submit_observations_handler(
    State(state): State<GatewayState>,
    Extension(context): Extension<AuthContext>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            GatewayError::Validation("Idempotency-Key header is required".to_string())
        })?
        .to_string();

    let bundle: Bundle = serde_json::from_value(body)
        .map_err(|e| GatewayError::Validation(format!("request body is not a FHIR Bundle: {e}")))?;
    if bundle.resource_type != "Bundle" {
        return Err(GatewayError::Validation(format!(
            "expected resourceType 'Bundle', got '{}'",
            bundle.resource_type
        )));
    }

    let outcome = handle_submission(&state, &context, &idempotency_key, &bundle).await?;

    let status = if outcome.replay {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((
        status,
        [(header::CONTENT_TYPE, "application/json")],
        outcome.response_json,
    )
        .into_response())
}
