//! Registered OAuth client.
//!
//! The authority knows exactly one public client: the mobile app. The
//! registry carries its identifier and the redirect-URI allowlist;
//! `redirect_uri` must be member-equal to the allowlist at both the
//! authorize and token endpoints.

use crate::error::IamError;

/// The single registered public client.
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    client_id: String,
    redirect_uris: Vec<String>,
}

impl ClientRegistry {
    /// Build the registry from configuration.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uris: Vec<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uris,
        }
    }

    /// The registered client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Reject any client identifier other than the registered one.
    pub fn check_client(&self, client_id: &str) -> Result<(), IamError> {
        if client_id == self.client_id {
            Ok(())
        } else {
            Err(IamError::InvalidClient(format!(
                "unknown client '{client_id}'"
            )))
        }
    }

    /// Reject redirect URIs outside the allowlist (strict exact match).
    pub fn check_redirect_uri(&self, redirect_uri: &str) -> Result<(), IamError> {
        if self.redirect_uris.iter().any(|uri| uri == redirect_uri) {
            Ok(())
        } else {
            Err(IamError::InvalidClient(
                "redirect_uri is not registered for this client".to_string(),
            ))
        }
    }
}
