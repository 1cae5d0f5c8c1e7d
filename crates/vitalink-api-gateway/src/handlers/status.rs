//! Per-subject transfer status query.

use crate::context::AuthContext;
use crate::error::GatewayError;
use crate::models::StatusResponse;
use crate::router::GatewayState;
use axum::{extract::State, Extension, Json};

/// Return the caller's transfer status as reported by the clinical
/// emitter. A downstream failure degrades to the zero-value document
/// rather than a synthetic error.
pub async fn status_handler(
    State(state): State<GatewayState>,
    Extension(context): Extension<AuthContext>,
) -> Result<Json<StatusResponse>, GatewayError> {
    let status = match state.forwarder.status(&context.subject).await {
        Ok(Some(clinical)) => StatusResponse::from(clinical),
        Ok(None) => StatusResponse::default(),
        Err(err) => {
            tracing::warn!(error = %err, subject = %context.subject, "Status fetch failed");
            StatusResponse::default()
        }
    };

    state.audit.status_query(&context.subject, "ok");
    Ok(Json(status))
}
