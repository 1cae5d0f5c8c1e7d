//! Append-only JSON-lines writer.
//!
//! Used for logs that are never rewritten (the gateway's audit trail).
//! A single mutex-guarded file handle keeps concurrent appends whole.

use crate::error::StoreError;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only JSON-lines file.
pub struct JsonlAppender {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAppender {
    /// Open the file for appending, creating it (and its parent directory)
    /// if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one entry as a sorted-key JSON line and flush.
    pub fn append<T: Serialize>(&self, entry: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(entry)?;
        let line = serde_json::to_string(&value)?;
        let mut file = self.file.lock().map_err(|_| StoreError::Poisoned)?;
        writeln!(file, "{line}").map_err(|e| StoreError::io(&self.path, e))?;
        file.flush().map_err(|e| StoreError::io(&self.path, e))
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Serialize, Deserialize)]
    struct Event {
        kind: String,
        outcome: String,
    }

    #[test]
    fn appends_one_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let log = JsonlAppender::open(dir.path().join("audit.log")).unwrap();

        log.append(&Event {
            kind: "submission".into(),
            outcome: "success".into(),
        })
        .unwrap();
        log.append(&Event {
            kind: "status_query".into(),
            outcome: "ok".into(),
        })
        .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"kind\":\"submission\""));
    }

    #[test]
    fn reopen_appends_to_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("audit.log");
        {
            let log = JsonlAppender::open(&path).unwrap();
            log.append(&Event {
                kind: "a".into(),
                outcome: "ok".into(),
            })
            .unwrap();
        }
        {
            let log = JsonlAppender::open(&path).unwrap();
            log.append(&Event {
                kind: "b".into(),
                outcome: "ok".into(),
            })
            .unwrap();
        }
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
