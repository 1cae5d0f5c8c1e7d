//! Gateway error taxonomy and JSON envelope.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error response body: `{error: <category>, message: <string>}` with
/// `retryAfterSeconds` added for rate-limit rejections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Error category.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Seconds to wait before retrying (rate limiting only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Ingestion gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing, malformed, invalid, expired or untrusted token.
    #[error("{0}")]
    Authentication(String),

    /// Per-subject sliding window exceeded.
    #[error("Rate limit exceeded, retry in {retry_after} seconds")]
    RateLimitExceeded {
        /// Seconds until the oldest window entry ages out.
        retry_after: u64,
    },

    /// Bad request shape, missing idempotency key, empty bundle.
    #[error("{0}")]
    Validation(String),

    /// Scope insufficiency (reserved).
    #[error("Forbidden")]
    Forbidden,

    /// Unknown resource.
    #[error("{0}")]
    NotFound(String),

    /// Store failure.
    #[error("Store error: {0}")]
    Store(#[from] vitalink_store::StoreError),

    /// Serialization, unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The error category string of the JSON envelope.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Authentication(_) => "authentication_error",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::Validation(_) => "validation_error",
            Self::Forbidden => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Store(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// The HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Gateway request failed");
        }

        let retry_after = match &self {
            Self::RateLimitExceeded { retry_after } => Some(*retry_after),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.category().to_string(),
            message: self.to_string(),
            retry_after_seconds: retry_after,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
