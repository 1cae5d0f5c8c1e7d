//! Identity authority HTTP surface.
//!
//! An OAuth 2.0 Authorization Code + PKCE provider for the patient-facing
//! mobile client: OIDC discovery, JWKS publication, an HTML credentials
//! form, token issuance with refresh rotation, RFC 7009 revocation, and
//! the staff-facing patient management endpoints.

pub mod client;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use client::ClientRegistry;
pub use error::IamError;
pub use router::{iam_router, IamState};
