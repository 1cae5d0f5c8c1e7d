//! Token endpoint handler.

use crate::error::IamError;
use crate::models::{TokenRequest, TokenResponse};
use crate::router::IamState;
use axum::{extract::State, Form, Json};

/// Exchange an authorization code or a refresh token for tokens.
pub async fn token_handler(
    State(state): State<IamState>,
    Form(request): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, IamError> {
    match request.grant_type.as_str() {
        "authorization_code" => handle_authorization_code_grant(&state, &request),
        "refresh_token" => handle_refresh_token_grant(&state, &request),
        _ => Err(IamError::UnsupportedGrantType(request.grant_type)),
    }
}

/// Handle `authorization_code` grant type.
///
/// Consumes the code atomically, checks the bound client and redirect
/// URI, verifies PKCE, then issues a fresh token pair.
fn handle_authorization_code_grant(
    state: &IamState,
    request: &TokenRequest,
) -> Result<Json<TokenResponse>, IamError> {
    let code = request
        .code
        .as_deref()
        .ok_or_else(|| IamError::InvalidRequest("code is required".to_string()))?;
    let redirect_uri = request
        .redirect_uri
        .as_deref()
        .ok_or_else(|| IamError::InvalidRequest("redirect_uri is required".to_string()))?;
    let code_verifier = request
        .code_verifier
        .as_deref()
        .ok_or_else(|| IamError::InvalidRequest("code_verifier is required".to_string()))?;
    let client_id = request
        .client_id
        .as_deref()
        .ok_or_else(|| IamError::InvalidRequest("client_id is required".to_string()))?;

    let entry =
        state
            .authorization_service
            .consume_code(code, client_id, redirect_uri, code_verifier)?;

    let response = state.token_service.issue_tokens(&entry.subject, &entry.scope)?;
    tracing::info!(subject = %entry.subject, "Exchanged authorization code for tokens");
    Ok(Json(response))
}

/// Handle `refresh_token` grant type with rotation.
fn handle_refresh_token_grant(
    state: &IamState,
    request: &TokenRequest,
) -> Result<Json<TokenResponse>, IamError> {
    let refresh_token = request
        .refresh_token
        .as_deref()
        .ok_or_else(|| IamError::InvalidRequest("refresh_token is required".to_string()))?;

    let response = state.token_service.rotate_refresh_token(refresh_token)?;
    Ok(Json(response))
}
