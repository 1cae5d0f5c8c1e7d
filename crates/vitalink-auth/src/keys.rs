//! ES256 signing-key lifecycle.
//!
//! A single P-256 key pair is generated on first start, persisted as
//! PKCS#8 PEM, and reloaded on every restart. The derived public key is
//! published as an EC JWK whose `kid` is the hex encoding of the first 8
//! bytes of SHA-256 over the uncompressed point (0x04 || x || y).

use crate::error::AuthError;
use crate::jwks::Jwk;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding};
use p256::SecretKey;
use sha2::{Digest, Sha256};
use std::path::Path;

/// A persisted P-256 signing key pair.
pub struct SigningKeyPair {
    private_key_pem: String,
    kid: String,
    x: String,
    y: String,
}

impl SigningKeyPair {
    /// Load the key pair from `path`, generating and persisting a fresh one
    /// if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::KeyStorage` on I/O failure and
    /// `AuthError::InvalidKey` when the persisted PEM does not parse. Both
    /// are fatal at service startup.
    pub fn load_or_generate(path: &Path) -> Result<Self, AuthError> {
        let pem = if path.exists() {
            std::fs::read_to_string(path)
                .map_err(|e| AuthError::KeyStorage(format!("read {}: {e}", path.display())))?
        } else {
            let secret = SecretKey::random(&mut rand::rngs::OsRng);
            let pem = secret
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| AuthError::InvalidKey(format!("encode private key: {e}")))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AuthError::KeyStorage(format!("create {}: {e}", parent.display()))
                })?;
            }
            std::fs::write(path, pem.as_bytes())
                .map_err(|e| AuthError::KeyStorage(format!("write {}: {e}", path.display())))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
            }
            pem.to_string()
        };

        Self::from_pkcs8_pem(&pem)
    }

    /// Build the pair from a PKCS#8 PEM string.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, AuthError> {
        let secret = SecretKey::from_pkcs8_pem(pem)
            .map_err(|e| AuthError::InvalidKey(format!("parse private key: {e}")))?;

        let point = secret.public_key().to_encoded_point(false);
        let bytes = point.as_bytes();
        // Uncompressed SEC1 encoding: 0x04 || x (32 bytes) || y (32 bytes).
        if bytes.len() != 65 {
            return Err(AuthError::InvalidKey(format!(
                "unexpected public point length {}",
                bytes.len()
            )));
        }

        let digest = Sha256::digest(bytes);
        let kid = hex::encode(&digest[..8]);
        let x = URL_SAFE_NO_PAD.encode(&bytes[1..33]);
        let y = URL_SAFE_NO_PAD.encode(&bytes[33..65]);

        Ok(Self {
            private_key_pem: pem.to_string(),
            kid,
            x,
            y,
        })
    }

    /// PEM-encoded private key for signing.
    #[must_use]
    pub fn private_key_pem(&self) -> &[u8] {
        self.private_key_pem.as_bytes()
    }

    /// Key identifier published in the JWKS and stamped into token headers.
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.kid
    }

    /// Public key as a JWK ready for JWKS publication.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        Jwk {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            kid: self.kid.clone(),
            key_use: "sig".to_string(),
            alg: "ES256".to_string(),
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }
}

impl std::fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generates_then_reloads_same_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ec_private_key.pem");

        let first = SigningKeyPair::load_or_generate(&path).unwrap();
        assert!(path.exists());

        let second = SigningKeyPair::load_or_generate(&path).unwrap();
        assert_eq!(first.kid(), second.kid());
        assert_eq!(first.to_jwk().x, second.to_jwk().x);
    }

    #[test]
    fn kid_is_16_hex_chars() {
        let dir = TempDir::new().unwrap();
        let pair = SigningKeyPair::load_or_generate(&dir.path().join("k.pem")).unwrap();
        assert_eq!(pair.kid().len(), 16);
        assert!(pair.kid().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn jwk_coordinates_decode_to_32_bytes() {
        let dir = TempDir::new().unwrap();
        let pair = SigningKeyPair::load_or_generate(&dir.path().join("k.pem")).unwrap();
        let jwk = pair.to_jwk();
        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.crv, "P-256");
        assert_eq!(jwk.alg, "ES256");
        let x = URL_SAFE_NO_PAD.decode(&jwk.x).unwrap();
        let y = URL_SAFE_NO_PAD.decode(&jwk.y).unwrap();
        assert_eq!(x.len(), 32);
        assert_eq!(y.len(), 32);
    }

    #[test]
    fn invalid_pem_is_rejected() {
        let result = SigningKeyPair::from_pkcs8_pem("not a key");
        assert!(matches!(result, Err(AuthError::InvalidKey(_))));
    }
}
