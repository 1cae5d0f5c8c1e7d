//! Gateway router and shared state.
//!
//! Routes:
//! - `GET /api/v1/metadata` - unauthenticated bootstrap document
//! - `POST /api/v1/observations` - Bearer-authenticated submission
//! - `GET /api/v1/status` - Bearer-authenticated status query
//! - `GET /health` - liveness
//!
//! Protected routes run the auth middleware first, then the rate
//! limiter, which keys on the subject the auth middleware verified.

use crate::error::GatewayError;
use crate::handlers::{metadata_handler, status_handler, submit_observations_handler};
use crate::middleware::{auth_middleware, rate_limit_middleware};
use crate::rate_limit::SlidingWindowLimiter;
use crate::services::{AuditLog, ClinicalForwarder, IdempotencyCache};
use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use vitalink_auth::JwksClient;

/// Application state for the ingestion gateway.
#[derive(Clone)]
pub struct GatewayState {
    /// Cached JWKS client against the identity authority.
    pub jwks: JwksClient,
    /// Per-subject sliding-window limiter.
    pub limiter: Arc<SlidingWindowLimiter>,
    /// Idempotency cache.
    pub idempotency: Arc<IdempotencyCache>,
    /// Append-only audit trail.
    pub audit: Arc<AuditLog>,
    /// Client for the clinical emitter.
    pub forwarder: Arc<ClinicalForwarder>,
    /// Absolute URL of the upstream OIDC discovery document.
    pub iam_discovery_url: String,
}

/// Construction parameters for [`GatewayState`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Persistence root holding `idempotency.txt` and `audit.log`.
    pub storage_dir: std::path::PathBuf,
    /// JWKS endpoint of the identity authority.
    pub jwks_url: String,
    /// OIDC discovery URL advertised in the metadata document.
    pub iam_discovery_url: String,
    /// Base URL of the clinical emitter.
    pub clinical_base_url: String,
    /// Maximum requests per subject per window.
    pub rate_limit_max: usize,
    /// Window length in seconds.
    pub rate_limit_window_secs: u64,
    /// Timeout for the forwarding call.
    pub forward_timeout: Duration,
}

impl GatewayState {
    /// Open the stores and build the state.
    ///
    /// # Errors
    ///
    /// Fails when a store cannot be opened or an HTTP client cannot be
    /// constructed; fatal at startup.
    pub fn new(options: &GatewayOptions) -> Result<Self, GatewayError> {
        let jwks = JwksClient::new(&options.jwks_url)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        let limiter = Arc::new(SlidingWindowLimiter::new(
            options.rate_limit_max,
            Duration::from_secs(options.rate_limit_window_secs),
        ));
        let idempotency = Arc::new(IdempotencyCache::open(
            &options.storage_dir.join("idempotency.txt"),
        )?);
        let audit = Arc::new(AuditLog::open(&options.storage_dir.join("audit.log"))?);
        let forwarder = Arc::new(
            ClinicalForwarder::new(&options.clinical_base_url, options.forward_timeout)
                .map_err(|e| GatewayError::Internal(e.to_string()))?,
        );

        Ok(Self {
            jwks,
            limiter,
            idempotency,
            audit,
            forwarder,
            iam_discovery_url: options.iam_discovery_url.clone(),
        })
    }

    /// Convenience for tests: state with an explicit storage path.
    pub fn open(
        storage_dir: &Path,
        jwks_url: &str,
        clinical_base_url: &str,
        rate_limit_max: usize,
        rate_limit_window_secs: u64,
    ) -> Result<Self, GatewayError> {
        Self::new(&GatewayOptions {
            storage_dir: storage_dir.to_path_buf(),
            jwks_url: jwks_url.to_string(),
            iam_discovery_url: format!(
                "{}/.well-known/openid-configuration",
                jwks_url.trim_end_matches("/jwks")
            ),
            clinical_base_url: clinical_base_url.to_string(),
            rate_limit_max,
            rate_limit_window_secs,
            forward_timeout: Duration::from_secs(10),
        })
    }
}

/// Build the gateway router.
pub fn gateway_router(state: GatewayState) -> Router {
    let protected = Router::new()
        .route("/api/v1/observations", post(submit_observations_handler))
        .route("/api/v1/status", get(status_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/v1/metadata", get(metadata_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// Liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
