//! Token plumbing shared by the vitalink services.
//!
//! The identity authority signs short-lived ES256 access tokens; the
//! ingestion gateway verifies them against the authority's published JWKS.
//! This crate holds both halves plus the PKCE primitives that bind an
//! authorization request to its token exchange.

mod claims;
mod error;
mod jwks;
mod jwt;
mod keys;
mod pkce;

pub use claims::{AccessClaims, AccessClaimsBuilder, ACCESS_TOKEN_TTL_SECS, AUDIENCE, ISSUER};
pub use error::AuthError;
pub use jwks::{Jwk, JwkSet, JwksClient};
pub use jwt::{decode_header_kid, encode_access_token, verify_access_token};
pub use keys::SigningKeyPair;
pub use pkce::{code_challenge, verify_code_verifier};
