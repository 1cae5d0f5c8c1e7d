//! JWT encoding and verification with the ES256 algorithm.
//!
//! Signing produces a compact JWS whose signature is the raw 64-byte
//! r||s form. Verification follows the gateway's procedure: structural
//! split, header checks, signature verification against JWK coordinates,
//! then explicit `exp`/`aud` claim checks (exp must be strictly in the
//! future; no leeway).

use crate::claims::AccessClaims;
use crate::error::AuthError;
use crate::jwks::Jwk;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Encode access claims into a signed ES256 token with the given `kid`.
///
/// # Errors
///
/// Returns `AuthError::InvalidKey` if the private key PEM does not parse
/// and `AuthError::InvalidToken` if encoding fails.
pub fn encode_access_token(
    claims: &AccessClaims,
    private_key_pem: &[u8],
    kid: &str,
) -> Result<String, AuthError> {
    let key = EncodingKey::from_ec_pem(private_key_pem)
        .map_err(|e| AuthError::InvalidKey(format!("Invalid private key: {e}")))?;

    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(kid.to_string());

    encode(&header, claims, &key).map_err(|e| AuthError::InvalidToken(format!("Encoding failed: {e}")))
}

/// Extract the `kid` from a token header, rejecting any algorithm other
/// than ES256.
///
/// # Errors
///
/// - `AuthError::InvalidToken` - malformed structure or header
/// - `AuthError::InvalidAlgorithm` - header algorithm is not ES256
/// - `AuthError::MissingClaim` - header carries no `kid`
pub fn decode_header_kid(token: &str) -> Result<String, AuthError> {
    if token.split('.').count() != 3 {
        return Err(AuthError::InvalidToken("Malformed token".to_string()));
    }

    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| AuthError::InvalidToken(format!("Invalid token header: {e}")))?;

    if header.alg != Algorithm::ES256 {
        return Err(AuthError::InvalidAlgorithm);
    }

    header.kid.ok_or_else(|| AuthError::MissingClaim("kid".to_string()))
}

/// Verify a token's signature against a JWK and check its claims.
///
/// Claim checks are explicit: `exp` must be strictly greater than the
/// current Unix timestamp and `aud` must equal `expected_aud`.
///
/// # Errors
///
/// - `AuthError::InvalidSignature` - signature does not verify
/// - `AuthError::TokenExpired` - `exp` is not in the future
/// - `AuthError::InvalidAudience` - `aud` differs from the expected literal
pub fn verify_access_token(
    token: &str,
    jwk: &Jwk,
    expected_aud: &str,
) -> Result<AccessClaims, AuthError> {
    let key: DecodingKey = jwk.to_decoding_key()?;

    // Signature and structure only; exp/aud are checked explicitly below
    // so the expiry boundary is strict rather than leeway-tolerant.
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<AccessClaims>(token, &key, &validation)
        .map_err(map_jwt_error)?;
    let claims = data.claims;

    if claims.exp <= Utc::now().timestamp() {
        return Err(AuthError::TokenExpired);
    }
    if claims.aud != expected_aud {
        return Err(AuthError::InvalidAudience(claims.aud));
    }

    Ok(claims)
}

/// Map jsonwebtoken errors to [`AuthError`].
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => AuthError::InvalidAlgorithm,
        ErrorKind::InvalidToken => AuthError::InvalidToken("Malformed token".to_string()),
        ErrorKind::Base64(_) => AuthError::InvalidToken("Invalid base64 encoding".to_string()),
        ErrorKind::Json(_) => AuthError::InvalidToken("Invalid JSON in claims".to_string()),
        ErrorKind::InvalidEcdsaKey => AuthError::InvalidKey("Invalid ECDSA key".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.to_string()),
        _ => AuthError::InvalidToken(format!("Token validation failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{ACCESS_TOKEN_TTL_SECS, AUDIENCE};
    use crate::keys::SigningKeyPair;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use tempfile::TempDir;

    fn test_pair() -> (TempDir, SigningKeyPair) {
        let dir = TempDir::new().unwrap();
        let pair = SigningKeyPair::load_or_generate(&dir.path().join("k.pem")).unwrap();
        (dir, pair)
    }

    fn sign(pair: &SigningKeyPair, claims: &AccessClaims) -> String {
        encode_access_token(claims, pair.private_key_pem(), pair.kid()).unwrap()
    }

    #[test]
    fn round_trip_preserves_claims() {
        let (_dir, pair) = test_pair();
        let claims = AccessClaims::builder()
            .subject("1")
            .scope("openid observation.write")
            .demographics("Max", "Mustermann", "1990-01-15")
            .build();

        let token = sign(&pair, &claims);
        assert_eq!(token.split('.').count(), 3);

        let decoded = verify_access_token(&token, &pair.to_jwk(), AUDIENCE).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.exp - decoded.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn header_kid_matches_signing_key() {
        let (_dir, pair) = test_pair();
        let token = sign(&pair, &AccessClaims::builder().subject("1").build());
        assert_eq!(decode_header_kid(&token).unwrap(), pair.kid());
    }

    #[test]
    fn signature_is_raw_64_bytes() {
        let (_dir, pair) = test_pair();
        let token = sign(&pair, &AccessClaims::builder().subject("1").build());
        let sig = token.split('.').nth(2).unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(sig).unwrap().len(), 64);
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let (_dir, pair) = test_pair();
        let token = sign(&pair, &AccessClaims::builder().subject("1").build());

        let mut parts: Vec<&str> = token.split('.').collect();
        let payload = serde_json::to_vec(
            &AccessClaims::builder().subject("2").build(),
        )
        .unwrap();
        let forged = URL_SAFE_NO_PAD.encode(payload);
        parts[1] = &forged;
        let forged_token = parts.join(".");

        let result = verify_access_token(&forged_token, &pair.to_jwk(), AUDIENCE);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn wrong_key_fails_signature() {
        let (_dir, pair) = test_pair();
        let (_dir2, other) = test_pair();
        let token = sign(&pair, &AccessClaims::builder().subject("1").build());

        let result = verify_access_token(&token, &other.to_jwk(), AUDIENCE);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn expiry_boundary_is_strict() {
        let (_dir, pair) = test_pair();
        let now = Utc::now().timestamp();

        // exp = now - 1
        let claims = AccessClaims::builder()
            .subject("1")
            .issued_at(now - ACCESS_TOKEN_TTL_SECS - 1)
            .build();
        let token = sign(&pair, &claims);
        assert!(matches!(
            verify_access_token(&token, &pair.to_jwk(), AUDIENCE),
            Err(AuthError::TokenExpired)
        ));

        // exp = now
        let claims = AccessClaims::builder()
            .subject("1")
            .issued_at(now - ACCESS_TOKEN_TTL_SECS)
            .build();
        let token = sign(&pair, &claims);
        assert!(matches!(
            verify_access_token(&token, &pair.to_jwk(), AUDIENCE),
            Err(AuthError::TokenExpired)
        ));

        // exp comfortably in the future
        let claims = AccessClaims::builder().subject("1").issued_at(now).build();
        let token = sign(&pair, &claims);
        assert!(verify_access_token(&token, &pair.to_jwk(), AUDIENCE).is_ok());
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let (_dir, pair) = test_pair();
        let token = sign(&pair, &AccessClaims::builder().subject("1").build());
        let result = verify_access_token(&token, &pair.to_jwk(), "some-other-service");
        assert!(matches!(result, Err(AuthError::InvalidAudience(_))));
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(matches!(
            decode_header_kid("not-a-jwt"),
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            decode_header_kid("a.b.c.d"),
            Err(AuthError::InvalidToken(_))
        ));
    }
}
