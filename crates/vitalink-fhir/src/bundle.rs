//! FHIR Bundle decoding for transaction submissions.

use crate::observation::Observation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a bundle; the resource stays raw until the pipeline
/// decides how to decode it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A FHIR Bundle of transaction entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    /// Always "Bundle".
    pub resource_type: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub bundle_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bundle {
    /// Decode every entry resource typed `Observation`.
    ///
    /// Entries whose resource is missing, not an Observation, or fails to
    /// decode are returned as per-entry errors so one bad entry never
    /// aborts its peers.
    #[must_use]
    pub fn observations(&self) -> Vec<Result<Observation, String>> {
        self.entry
            .iter()
            .map(|entry| match &entry.resource {
                None => Err("entry has no resource".to_string()),
                Some(resource) => {
                    let kind = resource
                        .get("resourceType")
                        .and_then(Value::as_str)
                        .unwrap_or("");
                    if kind != "Observation" {
                        return Err(format!("unsupported resource type '{kind}'"));
                    }
                    serde_json::from_value(resource.clone())
                        .map_err(|e| format!("invalid Observation: {e}"))
                }
            })
            .collect()
    }
}
