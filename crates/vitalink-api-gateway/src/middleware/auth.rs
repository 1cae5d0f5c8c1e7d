//! Bearer-token authentication middleware.
//!
//! Verification procedure: structural split, header algorithm check, key
//! lookup through the cached JWKS (refresh-once on miss), signature
//! verification against the JWK coordinates, then `exp`/`aud` checks. The
//! verified subject and demographics land in a request extension.

use crate::context::AuthContext;
use crate::error::GatewayError;
use crate::router::GatewayState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use vitalink_auth::{decode_header_kid, verify_access_token, AuthError, AUDIENCE};

/// Authenticate a protected request.
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    match verify_request(&state, request.headers()).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            Ok(next.run(request).await)
        }
        Err(reason) => {
            state.audit.rejection("auth_rejected", None, &reason);
            Err(GatewayError::Authentication(format!(
                "Authentication failed: {reason}"
            )))
        }
    }
}

/// Run the verification procedure, returning a categorical reason on
/// failure (the reason feeds the audit trail, not the client).
async fn verify_request(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Result<AuthContext, String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| "missing_authorization_header".to_string())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| "malformed_authorization_header".to_string())?;

    let kid = decode_header_kid(token).map_err(reason_for)?;

    let jwk = state
        .jwks
        .get_key(&kid)
        .await
        .map_err(reason_for)?;

    let claims = verify_access_token(token, &jwk, AUDIENCE).map_err(reason_for)?;
    Ok(AuthContext::from(claims))
}

/// Categorical audit reason for a verification failure.
fn reason_for(err: AuthError) -> String {
    match err {
        AuthError::TokenExpired => "token_expired".to_string(),
        AuthError::InvalidSignature => "invalid_signature".to_string(),
        AuthError::InvalidAlgorithm => "unsupported_algorithm".to_string(),
        AuthError::InvalidAudience(_) => "wrong_audience".to_string(),
        AuthError::InvalidToken(_) => "malformed_token".to_string(),
        AuthError::MissingClaim(_) => "missing_claim".to_string(),
        AuthError::KeyNotFound(_) => "unknown_signing_key".to_string(),
        AuthError::JwksFetchFailed(_) => "jwks_unavailable".to_string(),
        AuthError::InvalidKey(_) | AuthError::KeyStorage(_) => "invalid_key".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_categorical() {
        assert_eq!(reason_for(AuthError::TokenExpired), "token_expired");
        assert_eq!(reason_for(AuthError::InvalidSignature), "invalid_signature");
        assert_eq!(
            reason_for(AuthError::InvalidAudience("x".into())),
            "wrong_audience"
        );
        assert_eq!(
            reason_for(AuthError::KeyNotFound("kid".into())),
            "unknown_signing_key"
        );
    }
}
