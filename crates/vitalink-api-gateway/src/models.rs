//! Wire models of the gateway surface and the clinical downstream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitalink_core::PatientId;

/// Bootstrap document served at `/api/v1/metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    pub server_version: String,
    pub iam_discovery_url: String,
    pub supported_resource_types: Vec<String>,
}

/// Payload forwarded to the clinical emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardPayload {
    pub patient_id: PatientId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_date_of_birth: Option<String>,
    pub observations: Vec<Value>,
}

/// Per-entry result in a submission response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResult {
    /// `success` or `error`.
    pub status: String,
    /// File the emitter wrote, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdt_file_name: Option<String>,
    /// Non-fatal notes from the emitter.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// The failure, on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EntryResult {
    /// A failed entry with the given reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            gdt_file_name: None,
            warnings: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The canonical submission result returned to the mobile client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    /// `success`, `partial` or `error`.
    pub status: String,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    /// The caller's idempotency key, echoed back.
    pub idempotency_key: String,
    pub results: Vec<EntryResult>,
    pub processed_at: DateTime<Utc>,
}

impl SubmissionResult {
    /// Aggregate per-entry results into the caller-visible outcome.
    #[must_use]
    pub fn from_entries(
        idempotency_key: &str,
        results: Vec<EntryResult>,
    ) -> Self {
        let total = results.len();
        let successful = results.iter().filter(|r| r.status == "success").count();
        let failed = total - successful;
        let status = if failed == 0 {
            "success"
        } else if successful > 0 {
            "partial"
        } else {
            "error"
        };
        Self {
            status: status.to_string(),
            total_processed: total,
            successful,
            failed,
            idempotency_key: idempotency_key.to_string(),
            results,
            processed_at: Utc::now(),
        }
    }
}

/// The clinical emitter's response to `/api/v1/process`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub status: String,
    #[serde(default)]
    pub total_processed: usize,
    #[serde(default)]
    pub successful: usize,
    #[serde(default)]
    pub failed: usize,
    #[serde(default)]
    pub results: Vec<EntryResult>,
}

/// The clinical emitter's per-subject status.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalStatus {
    pub patient_id: PatientId,
    pub last_transfer: Option<DateTime<Utc>>,
    #[serde(default)]
    pub transfer_count: u64,
}

/// Status document returned to the mobile client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub has_successful_transfer: bool,
    pub last_successful_transfer: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub pending_count: u64,
}

impl From<ClinicalStatus> for StatusResponse {
    fn from(status: ClinicalStatus) -> Self {
        Self {
            has_successful_transfer: status.transfer_count > 0,
            last_successful_transfer: status.last_transfer,
            last_attempt: status.last_transfer,
            last_error: None,
            pending_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_entry() -> EntryResult {
        EntryResult {
            status: "success".into(),
            gdt_file_name: Some("obs_20230114_215112.gdt".into()),
            warnings: vec![],
            error: None,
        }
    }

    #[test]
    fn aggregate_success() {
        let result = SubmissionResult::from_entries("k1", vec![ok_entry(), ok_entry()]);
        assert_eq!(result.status, "success");
        assert_eq!(result.total_processed, 2);
        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 0);
        assert_eq!(result.idempotency_key, "k1");
    }

    #[test]
    fn aggregate_partial_and_error() {
        let partial =
            SubmissionResult::from_entries("k", vec![ok_entry(), EntryResult::failed("boom")]);
        assert_eq!(partial.status, "partial");

        let error = SubmissionResult::from_entries("k", vec![EntryResult::failed("boom")]);
        assert_eq!(error.status, "error");
        assert_eq!(error.failed, 1);
    }

    #[test]
    fn status_zero_value_document() {
        let zero = StatusResponse::default();
        let json = serde_json::to_value(&zero).unwrap();
        assert_eq!(json["hasSuccessfulTransfer"], false);
        assert_eq!(json["pendingCount"], 0);
        assert!(json["lastSuccessfulTransfer"].is_null());
    }

    #[test]
    fn clinical_status_maps_to_client_document() {
        let now = Utc::now();
        let status: StatusResponse = ClinicalStatus {
            patient_id: "1".into(),
            last_transfer: Some(now),
            transfer_count: 3,
        }
        .into();
        assert!(status.has_successful_transfer);
        assert_eq!(status.last_successful_transfer, Some(now));
        assert_eq!(status.last_attempt, Some(now));
    }

    #[test]
    fn forward_payload_serializes_camel_case() {
        let payload = ForwardPayload {
            patient_id: "1".into(),
            patient_first_name: Some("Max".into()),
            patient_last_name: Some("Mustermann".into()),
            patient_date_of_birth: Some("1990-01-15".into()),
            observations: vec![],
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"patientId\":\"1\""));
        assert!(json.contains("\"patientFirstName\":\"Max\""));
        assert!(json.contains("\"observations\":[]"));
    }
}
