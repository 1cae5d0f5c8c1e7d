//! Strongly typed identifiers.
//!
//! Patient identifiers are opaque decimal strings assigned by the identity
//! authority. The newtype prevents mixing them up with other string-shaped
//! values (idempotency keys, token values) at compile time.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque patient identifier (a decimal counter assigned at registration).
///
/// Identifiers are never reused, even after the patient record is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    /// Wrap an existing identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create the identifier for a counter value.
    #[must_use]
    pub fn from_seq(seq: u64) -> Self {
        Self(seq.to_string())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The counter value this identifier was assigned from, if it parses.
    #[must_use]
    pub fn seq(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Display for PatientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PatientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
