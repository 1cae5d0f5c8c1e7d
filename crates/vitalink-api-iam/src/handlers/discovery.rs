//! OIDC Discovery and JWKS handlers.

use crate::models::OpenIdConfiguration;
use crate::router::IamState;
use axum::{extract::State, Json};
use vitalink_auth::JwkSet;

/// Returns the OpenID Connect Discovery document.
pub async fn discovery_handler(State(state): State<IamState>) -> Json<OpenIdConfiguration> {
    Json(OpenIdConfiguration::new(&state.base_url))
}

/// Returns the JSON Web Key Set containing the signing public key.
pub async fn jwks_handler(State(state): State<IamState>) -> Json<JwkSet> {
    Json(JwkSet {
        keys: vec![state.signing_key.to_jwk()],
    })
}
