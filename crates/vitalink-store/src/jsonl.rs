//! Indexed JSON-lines store with atomic rewrite.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// An entry that can live in a [`JsonlStore`].
///
/// The key addresses the entry inside the store; expired entries are
/// dropped at startup and invisible to reads.
pub trait StoreEntry: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// The index key for this entry.
    fn key(&self) -> String;

    /// Whether the entry has aged out at `now`. Defaults to never.
    fn is_expired(&self, _now: DateTime<Utc>) -> bool {
        false
    }
}

struct Inner<T> {
    path: PathBuf,
    entries: BTreeMap<String, T>,
}

/// A file-backed store holding one JSON object per line.
///
/// All operations serialize through a single mutex; `remove` therefore
/// gives at-most-one-success semantics under concurrent consumption and
/// `insert_if_absent` is a compare-and-swap.
pub struct JsonlStore<T: StoreEntry> {
    inner: Mutex<Inner<T>>,
}

impl<T: StoreEntry> JsonlStore<T> {
    /// Open the store, rebuilding the index from the backing file and
    /// dropping entries that have expired.
    ///
    /// A missing file is an empty store; the file is created on first
    /// mutation.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut entries = BTreeMap::new();

        if path.exists() {
            let file = std::fs::File::open(&path).map_err(|e| StoreError::io(&path, e))?;
            let now = Utc::now();
            let mut dropped = 0usize;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|e| StoreError::io(&path, e))?;
                if line.trim().is_empty() {
                    continue;
                }
                let entry: T = serde_json::from_str(&line)?;
                if entry.is_expired(now) {
                    dropped += 1;
                    continue;
                }
                entries.insert(entry.key(), entry);
            }
            if dropped > 0 {
                tracing::debug!(path = %path.display(), dropped, "Dropped expired entries at startup");
            }
        }

        Ok(Self {
            inner: Mutex::new(Inner { path, entries }),
        })
    }

    /// Insert or replace an entry and persist.
    pub fn insert(&self, entry: T) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.entries.insert(entry.key(), entry);
        rewrite(&inner)
    }

    /// Insert only if the key is not yet present (first writer wins).
    ///
    /// Returns `true` when the entry was inserted, `false` when an entry
    /// already held the key.
    pub fn insert_if_absent(&self, entry: T) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let key = entry.key();
        if inner.entries.contains_key(&key) {
            return Ok(false);
        }
        inner.entries.insert(key, entry);
        rewrite(&inner)?;
        Ok(true)
    }

    /// Look up an entry by key. Expired entries read as absent.
    pub fn get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let inner = self.lock()?;
        let now = Utc::now();
        Ok(inner
            .entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .cloned())
    }

    /// Remove an entry, returning it if it was present and unexpired.
    ///
    /// This is the atomic `consume`: under concurrent calls for the same
    /// key, exactly one caller observes the entry.
    pub fn remove(&self, key: &str) -> Result<Option<T>, StoreError> {
        let mut inner = self.lock()?;
        let removed = inner.entries.remove(key);
        if removed.is_some() {
            rewrite(&inner)?;
        }
        Ok(removed.filter(|e| !e.is_expired(Utc::now())))
    }

    /// Remove every entry matching the predicate, returning how many went.
    pub fn remove_matching(&self, pred: impl Fn(&T) -> bool) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !pred(e));
        let removed = before - inner.entries.len();
        if removed > 0 {
            rewrite(&inner)?;
        }
        Ok(removed)
    }

    /// Read-modify-write a single key under the store lock.
    ///
    /// The closure sees the current entry (if any) and returns the new
    /// one; the result is persisted and returned.
    pub fn upsert_with(
        &self,
        key: &str,
        f: impl FnOnce(Option<&T>) -> T,
    ) -> Result<T, StoreError> {
        let mut inner = self.lock()?;
        let updated = f(inner.entries.get(key));
        inner.entries.insert(updated.key(), updated.clone());
        rewrite(&inner)?;
        Ok(updated)
    }

    /// All unexpired entries, in key order.
    pub fn values(&self) -> Result<Vec<T>, StoreError> {
        let inner = self.lock()?;
        let now = Utc::now();
        Ok(inner
            .entries
            .values()
            .filter(|e| !e.is_expired(now))
            .cloned()
            .collect())
    }

    /// Number of indexed entries (including not-yet-pruned expired ones).
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.entries.len())
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner<T>>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Rewrite the backing file atomically: serialize all entries to a
/// temporary file next to the target, then rename over it.
fn rewrite<T: StoreEntry>(inner: &Inner<T>) -> Result<(), StoreError> {
    if let Some(parent) = inner.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
    }

    let tmp_path = inner.path.with_extension("tmp");
    {
        let mut file =
            std::fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
        let now = Utc::now();
        for entry in inner.entries.values() {
            if entry.is_expired(now) {
                continue;
            }
            // Round-trip through Value so object keys serialize sorted.
            let value = serde_json::to_value(entry)?;
            let line = serde_json::to_string(&value)?;
            writeln!(file, "{line}").map_err(|e| StoreError::io(&tmp_path, e))?;
        }
        file.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
    }
    std::fs::rename(&tmp_path, &inner.path).map_err(|e| StoreError::io(&inner.path, e))
}
