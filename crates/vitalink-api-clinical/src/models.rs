//! Wire models of the clinical emitter surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitalink_core::PatientId;

/// Body of `POST /api/v1/process`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub patient_id: PatientId,
    #[serde(default)]
    pub patient_first_name: Option<String>,
    #[serde(default)]
    pub patient_last_name: Option<String>,
    #[serde(default)]
    pub patient_date_of_birth: Option<String>,
    #[serde(default)]
    pub observations: Vec<Value>,
}

/// Per-observation processing result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResult {
    /// `success` or `error`.
    pub status: String,
    /// Name of the written exchange file, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdt_file_name: Option<String>,
    /// Non-fatal mapping notes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// The failure, on error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /api/v1/process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    /// `success`, `partial` or `error`.
    pub status: String,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<EntryResult>,
}

impl ProcessResponse {
    /// Aggregate per-entry results.
    #[must_use]
    pub fn from_entries(results: Vec<EntryResult>) -> Self {
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
            results,
        }
    }
}

/// Response of `GET /api/v1/status/:patient_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub patient_id: PatientId,
    pub last_transfer: Option<DateTime<Utc>>,
    pub transfer_count: u64,
}
