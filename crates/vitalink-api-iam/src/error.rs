//! OAuth2/OIDC error types following RFC 6749.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OAuth2 error codes as defined in RFC 6749.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthErrorCode {
    /// The request is missing a required parameter.
    InvalidRequest,
    /// Client authentication failed.
    InvalidClient,
    /// The provided authorization grant or refresh token is invalid.
    InvalidGrant,
    /// The authorization server does not support the grant type.
    UnsupportedGrantType,
    /// The authorization server does not support the response type.
    UnsupportedResponseType,
    /// The requested scope is invalid, unknown, or malformed.
    InvalidScope,
    /// The authorization server encountered an unexpected condition.
    ServerError,
}

impl std::fmt::Display for OAuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant => "invalid_grant",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::InvalidScope => "invalid_scope",
            Self::ServerError => "server_error",
        };
        write!(f, "{s}")
    }
}

/// OAuth2 error response body following RFC 6749 Section 5.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthErrorResponse {
    /// Error code.
    pub error: OAuthErrorCode,
    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl OAuthErrorResponse {
    /// Create a new error response.
    pub fn new(error: OAuthErrorCode, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: Some(description.into()),
        }
    }
}

/// Identity authority API errors.
#[derive(Debug, Error)]
pub enum IamError {
    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed (unknown client, disallowed redirect).
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    /// Invalid, expired or consumed authorization code / refresh token,
    /// or a PKCE verifier that does not match its challenge.
    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    /// Unsupported grant type.
    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// Unsupported response type.
    #[error("Unsupported response type: {0}")]
    UnsupportedResponseType(String),

    /// Patient not found.
    #[error("Patient not found")]
    PatientNotFound,

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] vitalink_store::StoreError),

    /// Token signing error.
    #[error("Token error: {0}")]
    Token(#[from] vitalink_auth::AuthError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IamError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::InvalidClient(_)
            | Self::UnsupportedGrantType(_)
            | Self::UnsupportedResponseType(_) => StatusCode::BAD_REQUEST,
            Self::PatientNotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Token(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the OAuth2 error code for this error.
    pub fn error_code(&self) -> OAuthErrorCode {
        match self {
            Self::InvalidRequest(_) | Self::PatientNotFound => OAuthErrorCode::InvalidRequest,
            Self::InvalidClient(_) => OAuthErrorCode::InvalidClient,
            Self::InvalidGrant(_) => OAuthErrorCode::InvalidGrant,
            Self::UnsupportedGrantType(_) => OAuthErrorCode::UnsupportedGrantType,
            Self::UnsupportedResponseType(_) => OAuthErrorCode::UnsupportedResponseType,
            Self::Store(_) | Self::Token(_) | Self::Internal(_) => OAuthErrorCode::ServerError,
        }
    }
}

impl IntoResponse for IamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "IAM request failed");
        }
        let body = Json(OAuthErrorResponse::new(self.error_code(), self.to_string()));
        (status, body).into_response()
    }
}
