//! Idempotency cache.
//!
//! Caches the canonical submission response under `(key, subject)` for 24
//! hours. Writes are first-wins: a concurrent second attempt with the
//! same key observes the first write's result.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vitalink_store::{JsonlStore, StoreEntry, StoreError};

/// Cache entry lifetime.
const IDEMPOTENCY_TTL_HOURS: i64 = 24;

/// A cached canonical submission outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotencyEntry {
    pub idempotency_key: String,
    pub subject: String,
    /// The exact response body bytes originally returned.
    pub response_json: String,
    pub created_at: DateTime<Utc>,
}

impl StoreEntry for IdempotencyEntry {
    fn key(&self) -> String {
        composite_key(&self.idempotency_key, &self.subject)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at + Duration::hours(IDEMPOTENCY_TTL_HOURS) <= now
    }
}

/// The subject goes first and contains no separator, so distinct pairs
/// never collide.
fn composite_key(idempotency_key: &str, subject: &str) -> String {
    format!("{subject}\u{1f}{idempotency_key}")
}

/// File-backed idempotency cache.
pub struct IdempotencyCache {
    store: JsonlStore<IdempotencyEntry>,
}

impl IdempotencyCache {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonlStore::open(path)?,
        })
    }

    /// Look up the cached response for `(key, subject)`.
    pub fn get(&self, idempotency_key: &str, subject: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .store
            .get(&composite_key(idempotency_key, subject))?
            .map(|e| e.response_json))
    }

    /// Store a canonical response; the first writer wins. Returns the
    /// response now authoritative for the pair.
    pub fn put(
        &self,
        idempotency_key: &str,
        subject: &str,
        response_json: &str,
    ) -> Result<String, StoreError> {
        let entry = IdempotencyEntry {
            idempotency_key: idempotency_key.to_string(),
            subject: subject.to_string(),
            response_json: response_json.to_string(),
            created_at: Utc::now(),
        };
        let key = entry.key();
        let inserted = self.store.insert_if_absent(entry)?;
        if inserted {
            Ok(response_json.to_string())
        } else {
            // Lost the race: surface the canonical first write.
            Ok(self
                .store
                .get(&key)?
                .map(|e| e.response_json)
                .unwrap_or_else(|| response_json.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn caches_per_key_and_subject() {
        let dir = TempDir::new().unwrap();
        let cache = IdempotencyCache::open(&dir.path().join("idempotency.txt")).unwrap();

        cache.put("k1", "1", r#"{"status":"success"}"#).unwrap();
        assert_eq!(
            cache.get("k1", "1").unwrap().as_deref(),
            Some(r#"{"status":"success"}"#)
        );
        // Same key, different subject: miss.
        assert!(cache.get("k1", "2").unwrap().is_none());
        assert!(cache.get("k2", "1").unwrap().is_none());
    }

    #[test]
    fn first_write_wins() {
        let dir = TempDir::new().unwrap();
        let cache = IdempotencyCache::open(&dir.path().join("idempotency.txt")).unwrap();

        let first = cache.put("k1", "1", r#"{"attempt":1}"#).unwrap();
        let second = cache.put("k1", "1", r#"{"attempt":2}"#).unwrap();
        assert_eq!(first, r#"{"attempt":1}"#);
        assert_eq!(second, r#"{"attempt":1}"#);
        assert_eq!(cache.get("k1", "1").unwrap().unwrap(), r#"{"attempt":1}"#);
    }

    #[test]
    fn survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("idempotency.txt");
        {
            let cache = IdempotencyCache::open(&path).unwrap();
            cache.put("k1", "1", r#"{"ok":true}"#).unwrap();
        }
        let cache = IdempotencyCache::open(&path).unwrap();
        assert!(cache.get("k1", "1").unwrap().is_some());
    }
}
