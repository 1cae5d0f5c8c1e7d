//! Audit trail.
//!
//! One JSON line per event, appended to `audit.log`. Entries carry hashes
//! and categorical fields only, never observation payloads or any other
//! PHI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use vitalink_store::{JsonlAppender, StoreError};

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Event instant.
    pub timestamp: DateTime<Utc>,
    /// Event kind: `submission`, `status_query`, `auth_rejected`,
    /// `rate_limit_rejected`.
    pub event: String,
    /// Caller-supplied idempotency key, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Pseudonymous subject reference (the opaque patient identifier).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// SHA-256 hex of the forwarded request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_hash_sha256: Option<String>,
    /// Textual outcome.
    pub outcome: String,
    /// Entry count, for submissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Append-only audit log.
pub struct AuditLog {
    appender: JsonlAppender,
}

impl AuditLog {
    /// Open (or create) the audit file.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            appender: JsonlAppender::open(path)?,
        })
    }

    /// Record a submission with the hash of the exact forwarded payload.
    pub fn submission(
        &self,
        subject: &str,
        idempotency_key: &str,
        payload_hash: &str,
        outcome: &str,
        count: usize,
    ) {
        self.append(AuditEntry {
            timestamp: Utc::now(),
            event: "submission".to_string(),
            idempotency_key: Some(idempotency_key.to_string()),
            subject: Some(subject.to_string()),
            payload_hash_sha256: Some(payload_hash.to_string()),
            outcome: outcome.to_string(),
            count: Some(count),
        });
    }

    /// Record a status query.
    pub fn status_query(&self, subject: &str, outcome: &str) {
        self.append(AuditEntry {
            timestamp: Utc::now(),
            event: "status_query".to_string(),
            idempotency_key: None,
            subject: Some(subject.to_string()),
            payload_hash_sha256: None,
            outcome: outcome.to_string(),
            count: None,
        });
    }

    /// Record an authentication or rate-limit rejection with a categorical
    /// reason.
    pub fn rejection(&self, event: &str, subject: Option<&str>, reason: &str) {
        self.append(AuditEntry {
            timestamp: Utc::now(),
            event: event.to_string(),
            idempotency_key: None,
            subject: subject.map(str::to_string),
            payload_hash_sha256: None,
            outcome: reason.to_string(),
            count: None,
        });
    }

    fn append(&self, entry: AuditEntry) {
        // Audit failures must not fail the request; they are logged and
        // dropped.
        if let Err(err) = self.appender.append(&entry) {
            tracing::error!(error = %err, event = %entry.event, "Failed to append audit entry");
        }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.appender.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_one_line_per_event() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.log")).unwrap();

        log.submission("1", "k1", "abc123", "success", 1);
        log.status_query("1", "ok");
        log.rejection("auth_rejected", None, "malformed_token");

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"event\":\"submission\""));
        assert!(lines[0].contains("\"payloadHashSha256\":\"abc123\""));
        assert!(lines[1].contains("\"event\":\"status_query\""));
        assert!(lines[2].contains("\"outcome\":\"malformed_token\""));
    }

    #[test]
    fn entries_round_trip() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::open(&dir.path().join("audit.log")).unwrap();
        log.submission("2", "key-9", "deadbeef", "partial", 3);

        let content = std::fs::read_to_string(log.path()).unwrap();
        let entry: AuditEntry = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(entry.event, "submission");
        assert_eq!(entry.subject.as_deref(), Some("2"));
        assert_eq!(entry.count, Some(3));
    }
}
