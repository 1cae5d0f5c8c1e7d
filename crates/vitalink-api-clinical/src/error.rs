//! Clinical emitter error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error category.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Clinical emitter errors.
#[derive(Debug, Error)]
pub enum ClinicalError {
    /// Bad request shape.
    #[error("{0}")]
    Validation(String),

    /// No transfer status recorded for the subject.
    #[error("No transfers recorded for patient {0}")]
    StatusNotFound(String),

    /// Status store failure.
    #[error("Store error: {0}")]
    Store(#[from] vitalink_store::StoreError),

    /// Exchange-directory write failure.
    #[error("Exchange directory I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization, unexpected internal state.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClinicalError {
    fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::StatusNotFound(_) => "not_found",
            Self::Store(_) | Self::Io(_) | Self::Internal(_) => "internal_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::StatusNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ClinicalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Clinical request failed");
        }
        let body = ErrorResponse {
            error: self.category().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ClinicalError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ClinicalError::StatusNotFound("1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
