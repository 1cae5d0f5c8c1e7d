//! Token service: access-token issuance and refresh-token rotation.

use crate::error::IamError;
use crate::models::TokenResponse;
use crate::store::{PatientStore, RefreshTokenStore};
use std::sync::Arc;
use vitalink_auth::{
    encode_access_token, AccessClaims, SigningKeyPair, ACCESS_TOKEN_TTL_SECS,
};

/// Service issuing access tokens and rotating refresh tokens.
pub struct TokenService {
    patients: Arc<PatientStore>,
    refresh_tokens: Arc<RefreshTokenStore>,
    signing_key: Arc<SigningKeyPair>,
}

impl TokenService {
    /// Create a new token service.
    #[must_use]
    pub fn new(
        patients: Arc<PatientStore>,
        refresh_tokens: Arc<RefreshTokenStore>,
        signing_key: Arc<SigningKeyPair>,
    ) -> Self {
        Self {
            patients,
            refresh_tokens,
            signing_key,
        }
    }

    /// Issue a fresh access token plus refresh token for a subject.
    ///
    /// Demographics are co-located in the claims when the patient record
    /// still exists; a missing record never fails the exchange.
    pub fn issue_tokens(&self, subject: &str, scope: &str) -> Result<TokenResponse, IamError> {
        let mut builder = AccessClaims::builder().subject(subject).scope(scope);

        match self.patients.get(subject)? {
            Some(patient) => {
                builder = builder.demographics(
                    patient.given_name,
                    patient.family_name,
                    patient.date_of_birth,
                );
            }
            None => {
                tracing::warn!(subject, "No patient record at issuance, omitting demographics");
            }
        }

        let access_token = encode_access_token(
            &builder.build(),
            self.signing_key.private_key_pem(),
            self.signing_key.kid(),
        )?;
        let refresh_token = self.refresh_tokens.issue(subject, scope)?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: ACCESS_TOKEN_TTL_SECS,
            refresh_token,
            scope: scope.to_string(),
        })
    }

    /// Consume a refresh token and issue a rotated pair.
    ///
    /// The supplied token is atomically removed; reuse after rotation is
    /// `invalid_grant`.
    pub fn rotate_refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, IamError> {
        let entry = self.refresh_tokens.consume(refresh_token)?.ok_or_else(|| {
            IamError::InvalidGrant("Refresh token not found, expired, or already used".to_string())
        })?;

        tracing::info!(subject = %entry.subject, "Rotating refresh token");
        self.issue_tokens(&entry.subject, &entry.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitalink_auth::{verify_access_token, AUDIENCE};

    fn service() -> (TempDir, TokenService, Arc<SigningKeyPair>) {
        let dir = TempDir::new().unwrap();
        let patients = Arc::new(PatientStore::open(&dir.path().join("patients.txt")).unwrap());
        let refresh =
            Arc::new(RefreshTokenStore::open(&dir.path().join("refresh_tokens.txt")).unwrap());
        let signing =
            Arc::new(SigningKeyPair::load_or_generate(&dir.path().join("k.pem")).unwrap());

        patients.register("Max", "Mustermann", "1990-01-15").unwrap();

        let service = TokenService::new(patients, refresh, Arc::clone(&signing));
        (dir, service, signing)
    }

    #[test]
    fn issues_bearer_pair_with_demographics() {
        let (_dir, service, signing) = service();
        let response = service.issue_tokens("1", "openid observation.write").unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);
        assert_eq!(response.scope, "openid observation.write");

        let claims =
            verify_access_token(&response.access_token, &signing.to_jwk(), AUDIENCE).unwrap();
        assert_eq!(claims.sub, "1");
        assert_eq!(claims.iss, "iam-server");
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.given_name.as_deref(), Some("Max"));
        assert_eq!(claims.family_name.as_deref(), Some("Mustermann"));
        assert_eq!(claims.birth_date.as_deref(), Some("1990-01-15"));
    }

    #[test]
    fn unknown_subject_issues_without_demographics() {
        let (_dir, service, signing) = service();
        let response = service.issue_tokens("42", "openid").unwrap();

        let claims =
            verify_access_token(&response.access_token, &signing.to_jwk(), AUDIENCE).unwrap();
        assert_eq!(claims.sub, "42");
        assert!(claims.given_name.is_none());
        assert!(claims.birth_date.is_none());
    }

    #[test]
    fn rotation_invalidates_the_consumed_token() {
        let (_dir, service, _signing) = service();
        let first = service.issue_tokens("1", "openid").unwrap();

        let second = service.rotate_refresh_token(&first.refresh_token).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // Original token is gone after rotation.
        assert!(matches!(
            service.rotate_refresh_token(&first.refresh_token),
            Err(IamError::InvalidGrant(_))
        ));
        // The rotated token still works.
        assert!(service.rotate_refresh_token(&second.refresh_token).is_ok());
    }

    #[test]
    fn unknown_refresh_token_is_invalid_grant() {
        let (_dir, service, _signing) = service();
        assert!(matches!(
            service.rotate_refresh_token("never-issued"),
            Err(IamError::InvalidGrant(_))
        ));
    }
}
