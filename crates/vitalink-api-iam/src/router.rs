//! Identity authority router and shared state.
//!
//! Routes:
//! - `GET /.well-known/openid-configuration` - OIDC Discovery
//! - `GET /jwks` - JSON Web Key Set
//! - `GET|POST /authorize` - Authorization endpoint (HTML credentials form)
//! - `POST /token` - Token endpoint (`authorization_code`, `refresh_token`)
//! - `POST /revoke` - RFC 7009 token revocation
//! - `POST|GET /patients`, `GET|DELETE /patients/:id` - Patient management
//! - `GET /health` - Liveness

use crate::client::ClientRegistry;
use crate::error::IamError;
use crate::handlers::{
    authorize_page_handler, authorize_submit_handler, delete_patient_handler, discovery_handler,
    get_patient_handler, jwks_handler, list_patients_handler, register_patient_handler,
    revoke_handler, token_handler,
};
use crate::services::{AuthorizationService, TokenService};
use crate::store::{AuthCodeStore, PatientStore, RefreshTokenStore};
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;
use vitalink_auth::SigningKeyPair;

/// Application state for the identity authority.
#[derive(Clone)]
pub struct IamState {
    /// Patient store.
    pub patients: Arc<PatientStore>,
    /// Refresh token store.
    pub refresh_tokens: Arc<RefreshTokenStore>,
    /// Authorization code service.
    pub authorization_service: Arc<AuthorizationService>,
    /// Token issuance service.
    pub token_service: Arc<TokenService>,
    /// ES256 signing key pair.
    pub signing_key: Arc<SigningKeyPair>,
    /// Public base URL, used in the discovery document.
    pub base_url: String,
}

impl IamState {
    /// Open all stores under `storage_dir` and assemble the services.
    ///
    /// # Errors
    ///
    /// Fails when a store file cannot be read or the signing key cannot
    /// be loaded or generated; both are fatal at startup.
    pub fn new(
        storage_dir: &Path,
        base_url: impl Into<String>,
        clients: ClientRegistry,
    ) -> Result<Self, IamError> {
        let patients = Arc::new(PatientStore::open(&storage_dir.join("patients.txt"))?);
        let auth_codes = Arc::new(AuthCodeStore::open(&storage_dir.join("auth_codes.txt"))?);
        let refresh_tokens = Arc::new(RefreshTokenStore::open(
            &storage_dir.join("refresh_tokens.txt"),
        )?);
        let signing_key = Arc::new(SigningKeyPair::load_or_generate(
            &storage_dir.join("ec_private_key.pem"),
        )?);

        let authorization_service =
            Arc::new(AuthorizationService::new(Arc::clone(&auth_codes), clients));
        let token_service = Arc::new(TokenService::new(
            Arc::clone(&patients),
            Arc::clone(&refresh_tokens),
            Arc::clone(&signing_key),
        ));

        Ok(Self {
            patients,
            refresh_tokens,
            authorization_service,
            token_service,
            signing_key,
            base_url: base_url.into(),
        })
    }
}

/// Build the identity authority router.
pub fn iam_router(state: IamState) -> Router {
    Router::new()
        .route("/.well-known/openid-configuration", get(discovery_handler))
        .route("/jwks", get(jwks_handler))
        .route(
            "/authorize",
            get(authorize_page_handler).post(authorize_submit_handler),
        )
        .route("/token", post(token_handler))
        .route("/revoke", post(revoke_handler))
        .route(
            "/patients",
            post(register_patient_handler).get(list_patients_handler),
        )
        .route(
            "/patients/:id",
            get(get_patient_handler).delete(delete_patient_handler),
        )
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
