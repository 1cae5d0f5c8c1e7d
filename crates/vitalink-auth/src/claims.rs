//! Access-token claims with the subject demographics the clinical stage
//! needs co-located in the token, so the gateway never has to call back
//! into the identity authority for patient data.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Issuer literal carried in every access token.
pub const ISSUER: &str = "iam-server";

/// Audience literal naming the ingestion gateway.
pub const AUDIENCE: &str = "client-facing-server";

/// Access token lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 900;

/// JWT claims for a vitalink access token.
///
/// # Standard Claims (RFC 7519)
///
/// - `sub`: patient identifier
/// - `iss`: fixed issuer literal
/// - `aud`: fixed audience literal naming the gateway
/// - `exp` / `iat`: issuance window (`exp − iat` = 900)
///
/// # Custom Claims
///
/// - `scope`: granted scope string (space-separated)
/// - `given_name` / `family_name` / `birth_date`: optional subject
///   demographics, absent when the patient record is gone at issuance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// Subject - the patient identifier.
    pub sub: String,

    /// Issuer - who created the token.
    pub iss: String,

    /// Audience - the gateway literal.
    pub aud: String,

    /// Expiration time as Unix timestamp.
    pub exp: i64,

    /// Issued at as Unix timestamp.
    pub iat: i64,

    /// Granted scope string.
    pub scope: String,

    /// Subject given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Subject family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Subject date of birth (ISO calendar date).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

impl AccessClaims {
    /// Create a new builder for constructing access claims.
    #[must_use]
    pub fn builder() -> AccessClaimsBuilder {
        AccessClaimsBuilder::default()
    }

    /// Check if the token is expired (exp must be strictly in the future).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp <= Utc::now().timestamp()
    }

    /// Check if the granted scope set contains a specific scope.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }
}

/// Builder for [`AccessClaims`].
#[derive(Debug, Default)]
pub struct AccessClaimsBuilder {
    sub: Option<String>,
    scope: Option<String>,
    iat: Option<i64>,
    given_name: Option<String>,
    family_name: Option<String>,
    birth_date: Option<String>,
}

impl AccessClaimsBuilder {
    /// Set the subject (patient identifier).
    #[must_use]
    pub fn subject(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Set the granted scope string.
    #[must_use]
    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Pin the issued-at instant (defaults to now).
    #[must_use]
    pub fn issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    /// Attach subject demographics.
    #[must_use]
    pub fn demographics(
        mut self,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
        birth_date: impl Into<String>,
    ) -> Self {
        self.given_name = Some(given_name.into());
        self.family_name = Some(family_name.into());
        self.birth_date = Some(birth_date.into());
        self
    }

    /// Build the claims. `iss`, `aud` and the 900-second lifetime are fixed.
    #[must_use]
    pub fn build(self) -> AccessClaims {
        let iat = self.iat.unwrap_or_else(|| Utc::now().timestamp());
        AccessClaims {
            sub: self.sub.unwrap_or_default(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            exp: iat + ACCESS_TOKEN_TTL_SECS,
            iat,
            scope: self.scope.unwrap_or_default(),
            given_name: self.given_name,
            family_name: self.family_name,
            birth_date: self.birth_date,
        }
    }
}
