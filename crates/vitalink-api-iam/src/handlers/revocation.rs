//! RFC 7009 token revocation handler.

use crate::error::IamError;
use crate::models::RevokeRequest;
use crate::router::IamState;
use axum::{extract::State, http::StatusCode, Form};

/// Revoke a refresh token.
///
/// Per RFC 7009 the endpoint answers 200 whether or not the token was
/// known, so a caller cannot probe for live tokens.
pub async fn revoke_handler(
    State(state): State<IamState>,
    Form(request): Form<RevokeRequest>,
) -> Result<StatusCode, IamError> {
    state.refresh_tokens.revoke(&request.token)?;
    tracing::info!(
        hint = request.token_type_hint.as_deref().unwrap_or("none"),
        "Processed revocation request"
    );
    Ok(StatusCode::OK)
}
