//! PKCE (RFC 7636) challenge derivation and verification.
//!
//! Only the `S256` method is supported: the challenge is the unpadded
//! base64url encoding of SHA-256 over the ASCII verifier.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};

/// Derive an S256 code challenge from a verifier.
#[must_use]
pub fn code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Verify a code verifier against a stored challenge.
///
/// Comparison is constant-time over the derived challenge bytes.
#[must_use]
pub fn verify_code_verifier(code_verifier: &str, stored_challenge: &str) -> bool {
    let computed = code_challenge(code_verifier);
    subtle::ConstantTimeEq::ct_eq(computed.as_bytes(), stored_challenge.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 7636 appendix B test vector.
    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn derives_rfc7636_vector() {
        assert_eq!(code_challenge(VERIFIER), CHALLENGE);
    }

    #[test]
    fn verifier_succeeds_against_its_challenge() {
        assert!(verify_code_verifier(VERIFIER, CHALLENGE));
    }

    #[test]
    fn mutated_verifier_fails() {
        let mut mutated = VERIFIER.to_string();
        mutated.pop();
        mutated.push('A');
        assert!(!verify_code_verifier(&mutated, CHALLENGE));
        assert!(!verify_code_verifier("", CHALLENGE));
        assert!(!verify_code_verifier(&VERIFIER.to_lowercase(), CHALLENGE));
    }

    #[test]
    fn base64url_round_trips_arbitrary_bytes() {
        let inputs: [&[u8]; 4] = [b"", b"\x00", b"\xff\xfe\xfd", b"hello world"];
        for input in inputs {
            let encoded = URL_SAFE_NO_PAD.encode(input);
            assert!(!encoded.contains('='));
            let decoded = URL_SAFE_NO_PAD.decode(&encoded).unwrap();
            assert_eq!(decoded, input);
        }
    }
}
