//! Request-scoped authentication context.
//!
//! Set by the auth middleware and read by the rate limiter and handlers
//! via request extensions; never a thread-global.

use vitalink_auth::AccessClaims;

/// The verified caller of a protected request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Patient identifier from the token's `sub` claim.
    pub subject: String,
    /// Granted scope string.
    pub scope: String,
    /// Subject given name, when co-located in the token.
    pub given_name: Option<String>,
    /// Subject family name.
    pub family_name: Option<String>,
    /// Subject date of birth.
    pub birth_date: Option<String>,
}

impl From<AccessClaims> for AuthContext {
    fn from(claims: AccessClaims) -> Self {
        Self {
            subject: claims.sub,
            scope: claims.scope,
            given_name: claims.given_name,
            family_name: claims.family_name,
            birth_date: claims.birth_date,
        }
    }
}
