//! Per-subject rate-limit middleware.
//!
//! Runs after authentication and keys the sliding window on the verified
//! subject from the request's [`AuthContext`].

use crate::context::AuthContext;
use crate::error::GatewayError;
use crate::router::GatewayState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Admit or reject a protected request against the subject's window.
pub async fn rate_limit_middleware(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let subject = request
        .extensions()
        .get::<AuthContext>()
        .map(|context| context.subject.clone())
        .ok_or_else(|| {
            GatewayError::Internal("rate limiter ran without an auth context".to_string())
        })?;

    match state.limiter.try_acquire(&subject) {
        Ok(()) => Ok(next.run(request).await),
        Err(retry_after) => {
            state
                .audit
                .rejection("rate_limit_rejected", Some(&subject), "window_exceeded");
            tracing::info!(subject, retry_after, "Rate limit exceeded");
            Err(GatewayError::RateLimitExceeded { retry_after })
        }
    }
}
