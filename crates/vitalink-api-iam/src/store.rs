//! Identity authority stores: patients, authorization codes, refresh
//! tokens. All are JSON-lines files; codes and tokens are stored hashed,
//! the plaintext value only ever travels to the client.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Mutex;
use vitalink_core::PatientId;
use vitalink_store::{JsonlStore, StoreEntry, StoreError};

/// Authorization code expiry.
const AUTH_CODE_TTL_MINUTES: i64 = 10;

/// Refresh token expiry.
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Opaque value length in bytes (32 bytes = 256 bits).
const OPAQUE_VALUE_LENGTH: usize = 32;

/// Generate a high-entropy opaque value (code or refresh token).
fn generate_opaque_value() -> String {
    let mut bytes = [0u8; OPAQUE_VALUE_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash an opaque value for storage.
fn hash_value(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

// ── Patients ──────────────────────────────────────────────────────────────

/// A patient record. Deleted patients stay as tombstones so identifiers
/// are never reused across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientEntry {
    pub id: PatientId,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
}

impl StoreEntry for PatientEntry {
    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Patient store with sequential identifier assignment.
pub struct PatientStore {
    store: JsonlStore<PatientEntry>,
    next_seq: Mutex<u64>,
}

impl PatientStore {
    /// Open the store and derive the next identifier from the highest one
    /// ever assigned (tombstones included).
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = JsonlStore::open(path)?;
        let max_seq = store
            .values()?
            .iter()
            .filter_map(|p: &PatientEntry| p.id.seq())
            .max()
            .unwrap_or(0);
        Ok(Self {
            store,
            next_seq: Mutex::new(max_seq + 1),
        })
    }

    /// Register a new patient, returning the freshly assigned record.
    pub fn register(
        &self,
        given_name: &str,
        family_name: &str,
        date_of_birth: &str,
    ) -> Result<PatientEntry, StoreError> {
        let mut seq = self.next_seq.lock().map_err(|_| StoreError::Poisoned)?;
        let entry = PatientEntry {
            id: PatientId::from_seq(*seq),
            given_name: given_name.to_string(),
            family_name: family_name.to_string(),
            date_of_birth: date_of_birth.to_string(),
            created_at: Utc::now(),
            deleted: false,
        };
        self.store.insert(entry.clone())?;
        *seq += 1;
        Ok(entry)
    }

    /// Look up a live patient.
    pub fn get(&self, id: &str) -> Result<Option<PatientEntry>, StoreError> {
        Ok(self.store.get(id)?.filter(|p| !p.deleted))
    }

    /// All live patients.
    pub fn list(&self) -> Result<Vec<PatientEntry>, StoreError> {
        Ok(self
            .store
            .values()?
            .into_iter()
            .filter(|p| !p.deleted)
            .collect())
    }

    /// Mark a patient deleted. Returns whether a live record existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let Some(mut entry) = self.store.get(id)?.filter(|p| !p.deleted) else {
            return Ok(false);
        };
        entry.deleted = true;
        self.store.insert(entry)?;
        Ok(true)
    }
}

// ── Authorization codes ───────────────────────────────────────────────────

/// A pending authorization code binding, stored under the code's hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCodeEntry {
    pub code_hash: String,
    pub client_id: String,
    pub subject: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub created_at: DateTime<Utc>,
}

impl StoreEntry for AuthCodeEntry {
    fn key(&self) -> String {
        self.code_hash.clone()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at + Duration::minutes(AUTH_CODE_TTL_MINUTES) <= now
    }
}

/// Single-use authorization code store.
pub struct AuthCodeStore {
    store: JsonlStore<AuthCodeEntry>,
}

impl AuthCodeStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonlStore::open(path)?,
        })
    }

    /// Issue a code bound to the given tuple. Returns the plaintext code.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &self,
        client_id: &str,
        subject: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
        code_challenge: &str,
        code_challenge_method: &str,
    ) -> Result<String, StoreError> {
        let code = generate_opaque_value();
        self.store.insert(AuthCodeEntry {
            code_hash: hash_value(&code),
            client_id: client_id.to_string(),
            subject: subject.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: scope.to_string(),
            state: state.to_string(),
            code_challenge: code_challenge.to_string(),
            code_challenge_method: code_challenge_method.to_string(),
            created_at: Utc::now(),
        })?;
        Ok(code)
    }

    /// Atomically consume a code: at most one caller gets the binding.
    /// Expired, consumed and never-issued codes are indistinguishable.
    pub fn consume(&self, code: &str) -> Result<Option<AuthCodeEntry>, StoreError> {
        self.store.remove(&hash_value(code))
    }
}

// ── Refresh tokens ────────────────────────────────────────────────────────

/// A refresh token binding, stored under the token's hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshTokenEntry {
    pub token_hash: String,
    pub subject: String,
    pub scope: String,
    pub created_at: DateTime<Utc>,
}

impl StoreEntry for RefreshTokenEntry {
    fn key(&self) -> String {
        self.token_hash.clone()
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at + Duration::days(REFRESH_TOKEN_TTL_DAYS) <= now
    }
}

/// Single-use refresh token store with rotation handled by the caller.
pub struct RefreshTokenStore {
    store: JsonlStore<RefreshTokenEntry>,
}

impl RefreshTokenStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonlStore::open(path)?,
        })
    }

    /// Issue a fresh token bound to subject and scope. Returns plaintext.
    pub fn issue(&self, subject: &str, scope: &str) -> Result<String, StoreError> {
        let token = generate_opaque_value();
        self.store.insert(RefreshTokenEntry {
            token_hash: hash_value(&token),
            subject: subject.to_string(),
            scope: scope.to_string(),
            created_at: Utc::now(),
        })?;
        Ok(token)
    }

    /// Atomically consume a token, returning its binding.
    pub fn consume(&self, token: &str) -> Result<Option<RefreshTokenEntry>, StoreError> {
        self.store.remove(&hash_value(token))
    }

    /// RFC 7009 revocation: remove if present, succeed either way.
    pub fn revoke(&self, token: &str) -> Result<(), StoreError> {
        self.store.remove(&hash_value(token))?;
        Ok(())
    }

    /// Remove every token bound to a subject (patient-delete cascade).
    pub fn revoke_all_for_subject(&self, subject: &str) -> Result<usize, StoreError> {
        self.store.remove_matching(|t| t.subject == subject)
    }
}
