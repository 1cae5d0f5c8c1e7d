//! Error types for authentication operations.

use thiserror::Error;

/// Authentication error types.
///
/// Each variant maps to a specific failure mode in token issuance or
/// verification.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // JWT errors
    /// Token has expired (exp claim is not in the future).
    #[error("Token has expired")]
    TokenExpired,

    /// Token signature is invalid.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token format is malformed or invalid.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token uses an unsupported algorithm (only ES256 is allowed).
    #[error("Unsupported algorithm: only ES256 is allowed")]
    InvalidAlgorithm,

    /// Token audience does not match the expected literal.
    #[error("Invalid audience: {0}")]
    InvalidAudience(String),

    /// Required claim is missing from token.
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    // JWKS errors
    /// Failed to fetch JWKS from endpoint.
    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    /// Key with specified kid not found in JWKS.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    // Key errors
    /// EC key is invalid or malformed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Key material could not be read or written at rest.
    #[error("Key storage failed: {0}")]
    KeyStorage(String),
}

impl AuthError {
    /// Check if this error indicates an expired token.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::TokenExpired)
    }

    /// Check if this error is related to JWT validation (as opposed to key
    /// material or JWKS transport).
    #[must_use]
    pub fn is_jwt_error(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExpired
                | AuthError::InvalidSignature
                | AuthError::InvalidToken(_)
                | AuthError::InvalidAlgorithm
                | AuthError::InvalidAudience(_)
                | AuthError::MissingClaim(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(AuthError::TokenExpired.to_string(), "Token has expired");
        assert_eq!(
            AuthError::InvalidToken("malformed base64".to_string()).to_string(),
            "Invalid token: malformed base64"
        );
        assert_eq!(
            AuthError::MissingClaim("sub".to_string()).to_string(),
            "Missing required claim: sub"
        );
    }

    #[test]
    fn test_is_jwt_error() {
        assert!(AuthError::TokenExpired.is_jwt_error());
        assert!(AuthError::InvalidSignature.is_jwt_error());
        assert!(AuthError::InvalidAudience("x".into()).is_jwt_error());
        assert!(!AuthError::JwksFetchFailed("down".into()).is_jwt_error());
        assert!(!AuthError::KeyStorage("io".into()).is_jwt_error());
    }
}
