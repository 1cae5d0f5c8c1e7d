//! Per-subject transfer status store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vitalink_core::PatientId;
use vitalink_store::{JsonlStore, StoreEntry, StoreError};

/// Running transfer status of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStatusEntry {
    pub patient_id: PatientId,
    pub last_transfer: DateTime<Utc>,
    pub transfer_count: u64,
}

impl StoreEntry for TransferStatusEntry {
    fn key(&self) -> String {
        self.patient_id.to_string()
    }
}

/// Status store with serialized mutation.
pub struct TransferStatusStore {
    store: JsonlStore<TransferStatusEntry>,
}

impl TransferStatusStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            store: JsonlStore::open(path)?,
        })
    }

    /// Record one successful transfer: bump the counter and stamp now.
    pub fn record_transfer(
        &self,
        patient_id: &PatientId,
    ) -> Result<TransferStatusEntry, StoreError> {
        self.store.upsert_with(patient_id.as_str(), |previous| {
            let transfer_count = previous.map_or(1, |p| p.transfer_count + 1);
            TransferStatusEntry {
                patient_id: patient_id.clone(),
                last_transfer: Utc::now(),
                transfer_count,
            }
        })
    }

    /// The subject's status, if any transfer was ever recorded.
    pub fn get(&self, patient_id: &str) -> Result<Option<TransferStatusEntry>, StoreError> {
        self.store.get(patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pid(s: &str) -> PatientId {
        PatientId::new(s)
    }

    #[test]
    fn counts_transfers_per_subject() {
        let dir = TempDir::new().unwrap();
        let store = TransferStatusStore::open(&dir.path().join("clinical_status.txt")).unwrap();

        assert!(store.get("1").unwrap().is_none());

        let first = store.record_transfer(&pid("1")).unwrap();
        assert_eq!(first.transfer_count, 1);

        let second = store.record_transfer(&pid("1")).unwrap();
        assert_eq!(second.transfer_count, 2);
        assert!(second.last_transfer >= first.last_transfer);

        assert_eq!(store.record_transfer(&pid("2")).unwrap().transfer_count, 1);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clinical_status.txt");
        {
            let store = TransferStatusStore::open(&path).unwrap();
            store.record_transfer(&pid("1")).unwrap();
            store.record_transfer(&pid("1")).unwrap();
        }
        let store = TransferStatusStore::open(&path).unwrap();
        assert_eq!(store.get("1").unwrap().unwrap().transfer_count, 2);
    }
}
