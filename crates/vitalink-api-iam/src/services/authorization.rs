//! Authorization service for the OAuth2 authorization code flow.

use crate::client::ClientRegistry;
use crate::error::IamError;
use crate::models::AuthorizeQuery;
use crate::store::{AuthCodeEntry, AuthCodeStore};
use std::sync::Arc;
use vitalink_auth::verify_code_verifier;

/// Service for validating authorization requests and managing codes.
pub struct AuthorizationService {
    codes: Arc<AuthCodeStore>,
    clients: ClientRegistry,
}

impl AuthorizationService {
    /// Create a new authorization service.
    #[must_use]
    pub fn new(codes: Arc<AuthCodeStore>, clients: ClientRegistry) -> Self {
        Self { codes, clients }
    }

    /// Validate the authorization request parameters.
    pub fn validate_authorization_request(&self, request: &AuthorizeQuery) -> Result<(), IamError> {
        if request.response_type != "code" {
            return Err(IamError::UnsupportedResponseType(
                request.response_type.clone(),
            ));
        }

        if request.code_challenge_method != "S256" {
            return Err(IamError::InvalidRequest(
                "Only S256 code_challenge_method is supported".to_string(),
            ));
        }

        if request.code_challenge.is_empty() {
            return Err(IamError::InvalidRequest(
                "code_challenge must not be empty".to_string(),
            ));
        }

        if request.state.is_empty() {
            return Err(IamError::InvalidRequest(
                "state must not be empty".to_string(),
            ));
        }

        self.clients.check_client(&request.client_id)?;
        self.clients.check_redirect_uri(&request.redirect_uri)?;

        Ok(())
    }

    /// Issue an authorization code bound to the authenticated subject and
    /// the request tuple.
    pub fn issue_code(&self, subject: &str, request: &AuthorizeQuery) -> Result<String, IamError> {
        let code = self.codes.issue(
            &request.client_id,
            subject,
            &request.redirect_uri,
            &request.scope,
            &request.state,
            &request.code_challenge,
            &request.code_challenge_method,
        )?;
        tracing::info!(subject, client_id = %request.client_id, "Issued authorization code");
        Ok(code)
    }

    /// Validate and consume an authorization code for a token exchange.
    ///
    /// Consumption is atomic: a concurrent exchange of the same code gets
    /// `invalid_grant`. Unknown, expired and already-used codes are
    /// indistinguishable.
    pub fn consume_code(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<AuthCodeEntry, IamError> {
        self.clients.check_redirect_uri(redirect_uri)?;

        let entry = self.codes.consume(code)?.ok_or_else(|| {
            IamError::InvalidGrant(
                "Authorization code not found, expired, or already used".to_string(),
            )
        })?;

        if entry.client_id != client_id {
            return Err(IamError::InvalidGrant(
                "client_id does not match the authorization code".to_string(),
            ));
        }
        if entry.redirect_uri != redirect_uri {
            return Err(IamError::InvalidGrant(
                "redirect_uri does not match the authorization code".to_string(),
            ));
        }
        if !verify_code_verifier(code_verifier, &entry.code_challenge) {
            return Err(IamError::InvalidGrant(
                "PKCE code verifier does not match the challenge".to_string(),
            ));
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitalink_auth::code_challenge;

    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    fn service() -> (TempDir, AuthorizationService) {
        let dir = TempDir::new().unwrap();
        let codes = Arc::new(AuthCodeStore::open(&dir.path().join("auth_codes.txt")).unwrap());
        let clients = ClientRegistry::new("mobile-app", vec!["app://callback".to_string()]);
        (dir, AuthorizationService::new(codes, clients))
    }

    fn request() -> AuthorizeQuery {
        AuthorizeQuery {
            response_type: "code".to_string(),
            client_id: "mobile-app".to_string(),
            redirect_uri: "app://callback".to_string(),
            scope: "openid observation.write".to_string(),
            state: "af0ifjsldkj".to_string(),
            code_challenge: code_challenge(VERIFIER),
            code_challenge_method: "S256".to_string(),
        }
    }

    #[test]
    fn validates_happy_path() {
        let (_dir, service) = service();
        assert!(service.validate_authorization_request(&request()).is_ok());
    }

    #[test]
    fn rejects_bad_parameters() {
        let (_dir, service) = service();

        let mut r = request();
        r.response_type = "token".to_string();
        assert!(matches!(
            service.validate_authorization_request(&r),
            Err(IamError::UnsupportedResponseType(_))
        ));

        let mut r = request();
        r.code_challenge_method = "plain".to_string();
        assert!(service.validate_authorization_request(&r).is_err());

        let mut r = request();
        r.state = String::new();
        assert!(service.validate_authorization_request(&r).is_err());

        let mut r = request();
        r.code_challenge = String::new();
        assert!(service.validate_authorization_request(&r).is_err());

        let mut r = request();
        r.client_id = "intruder".to_string();
        assert!(matches!(
            service.validate_authorization_request(&r),
            Err(IamError::InvalidClient(_))
        ));

        let mut r = request();
        r.redirect_uri = "https://evil.example/cb".to_string();
        assert!(matches!(
            service.validate_authorization_request(&r),
            Err(IamError::InvalidClient(_))
        ));
    }

    #[test]
    fn code_flow_with_pkce_round_trip() {
        let (_dir, service) = service();
        let code = service.issue_code("1", &request()).unwrap();

        let entry = service
            .consume_code(&code, "mobile-app", "app://callback", VERIFIER)
            .unwrap();
        assert_eq!(entry.subject, "1");
        assert_eq!(entry.scope, "openid observation.write");

        // Single use: the same code fails the second time.
        assert!(matches!(
            service.consume_code(&code, "mobile-app", "app://callback", VERIFIER),
            Err(IamError::InvalidGrant(_))
        ));
    }

    #[test]
    fn pkce_mismatch_is_invalid_grant() {
        let (_dir, service) = service();
        let code = service.issue_code("1", &request()).unwrap();

        let wrong_verifier = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
        assert!(matches!(
            service.consume_code(&code, "mobile-app", "app://callback", wrong_verifier),
            Err(IamError::InvalidGrant(_))
        ));
        // The failed attempt consumed the code.
        assert!(service
            .consume_code(&code, "mobile-app", "app://callback", VERIFIER)
            .is_err());
    }

    #[test]
    fn bound_tuple_mismatches_are_rejected() {
        let (_dir, service) = service();

        let code = service.issue_code("1", &request()).unwrap();
        assert!(matches!(
            service.consume_code(&code, "other-app", "app://callback", VERIFIER),
            Err(IamError::InvalidGrant(_))
        ));

        let code = service.issue_code("1", &request()).unwrap();
        assert!(matches!(
            service.consume_code(&code, "mobile-app", "https://evil.example/cb", VERIFIER),
            Err(IamError::InvalidClient(_))
        ));
    }
}
