//! Observation → GDT conversion and exchange-directory emission.

use crate::error::ClinicalError;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use vitalink_fhir::{Observation, Reference};
use vitalink_gdt::{map_observation, GdtDocument};

/// The outcome of emitting one observation.
#[derive(Debug)]
pub struct ProcessedObservation {
    /// File name inside the exchange directory.
    pub gdt_file_name: String,
    /// Non-fatal mapping notes.
    pub warnings: Vec<String>,
}

/// Renders observations into GDT files in the exchange directory.
pub struct GdtEmitter {
    output_dir: PathBuf,
    sender_id: String,
    receiver_id: String,
}

impl GdtEmitter {
    /// Create an emitter writing into `output_dir` (created on demand).
    #[must_use]
    pub fn new(
        output_dir: impl Into<PathBuf>,
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
        }
    }

    /// The exchange directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert one raw observation and write its GDT file.
    ///
    /// A missing `subject` is synthesized from the request's patient
    /// identifier and demographics (`display` = "family, given").
    pub fn emit(
        &self,
        raw: &Value,
        patient_id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<ProcessedObservation, ClinicalError> {
        let kind = raw.get("resourceType").and_then(Value::as_str).unwrap_or("");
        if kind != "Observation" {
            return Err(ClinicalError::Validation(format!(
                "unsupported resource type '{kind}'"
            )));
        }
        let mut observation: Observation = serde_json::from_value(raw.clone())
            .map_err(|e| ClinicalError::Validation(format!("invalid Observation: {e}")))?;

        if observation.subject.is_none() {
            observation.subject = Some(synthesize_subject(patient_id, first_name, last_name));
        }

        let mut document = GdtDocument::new(&self.sender_id, &self.receiver_id);
        let mapped = map_observation(&observation, &mut document);

        std::fs::create_dir_all(&self.output_dir)?;
        let file_name = self.write_unique(&document.to_bytes())?;

        Ok(ProcessedObservation {
            gdt_file_name: file_name,
            warnings: mapped.warnings,
        })
    }

    /// Write the document under a fresh `obs_<UTC-compact-timestamp>.gdt`
    /// name, suffixing a counter on collision.
    fn write_unique(&self, bytes: &[u8]) -> Result<String, ClinicalError> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S%3f").to_string();
        let mut candidate = format!("obs_{stamp}.gdt");
        let mut n = 1u32;
        while self.output_dir.join(&candidate).exists() {
            candidate = format!("obs_{stamp}_{n}.gdt");
            n += 1;
        }
        std::fs::write(self.output_dir.join(&candidate), bytes)?;
        Ok(candidate)
    }
}

fn synthesize_subject(
    patient_id: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
) -> Reference {
    let display = match (last_name, first_name) {
        (Some(family), Some(given)) => Some(format!("{family}, {given}")),
        (Some(family), None) => Some(family.to_string()),
        (None, Some(given)) => Some(given.to_string()),
        (None, None) => None,
    };
    Reference {
        reference: Some(format!("Patient/{patient_id}")),
        display,
        extra: Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ecg() -> Value {
        serde_json::json!({
            "resourceType": "Observation",
            "status": "final",
            "code": {
                "coding": [{
                    "system": "http://loinc.org",
                    "code": "11524-6",
                    "display": "EKG study"
                }]
            },
            "effectivePeriod": {"start": "2023-01-14T22:51:12+01:00"}
        })
    }

    #[test]
    fn emits_framed_file_with_synthesized_subject() {
        let dir = TempDir::new().unwrap();
        let emitter = GdtEmitter::new(dir.path().join("gdt"), "VITA", "PRAX");

        let processed = emitter
            .emit(&ecg(), "1", Some("Max"), Some("Mustermann"))
            .unwrap();
        assert!(processed.gdt_file_name.starts_with("obs_"));
        assert!(processed.gdt_file_name.ends_with(".gdt"));

        let bytes =
            std::fs::read(emitter.output_dir().join(&processed.gdt_file_name)).unwrap();
        let text: String = bytes.iter().map(|&b| b as char).collect();

        assert!(text.starts_with("01380006310\r\n"));
        assert!(text.contains("02.10"));
        assert!(text.contains("14012023"));
        assert!(text.contains("225112"));
        assert!(text.lines().any(|l| &l[3..7] == "3000" && &l[7..] == "1"));
        assert!(text
            .lines()
            .any(|l| &l[3..7] == "3101" && &l[7..] == "Mustermann"));
        assert!(text.lines().any(|l| &l[3..7] == "3102" && &l[7..] == "Max"));

        // Declared record length equals the file's byte count.
        let declared: usize = text
            .lines()
            .find(|l| &l[3..7] == "8100")
            .map(|l| l[7..].parse().unwrap())
            .unwrap();
        assert_eq!(declared, bytes.len());
    }

    #[test]
    fn existing_subject_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let emitter = GdtEmitter::new(dir.path().join("gdt"), "VITA", "PRAX");

        let mut raw = ecg();
        raw["subject"] = serde_json::json!({
            "reference": "Patient/77",
            "display": "Musterfrau, Erika"
        });
        let processed = emitter.emit(&raw, "1", Some("Max"), Some("Mustermann")).unwrap();
        let bytes =
            std::fs::read(emitter.output_dir().join(&processed.gdt_file_name)).unwrap();
        let text: String = bytes.iter().map(|&b| b as char).collect();
        assert!(text.lines().any(|l| &l[3..7] == "3000" && &l[7..] == "77"));
        assert!(text
            .lines()
            .any(|l| &l[3..7] == "3101" && &l[7..] == "Musterfrau"));
    }

    #[test]
    fn non_observation_is_a_validation_error() {
        let dir = TempDir::new().unwrap();
        let emitter = GdtEmitter::new(dir.path().join("gdt"), "VITA", "PRAX");
        let err = emitter
            .emit(&serde_json::json!({"resourceType": "Patient"}), "1", None, None)
            .unwrap_err();
        assert!(matches!(err, ClinicalError::Validation(_)));
    }

    #[test]
    fn file_names_are_unique_per_call() {
        let dir = TempDir::new().unwrap();
        let emitter = GdtEmitter::new(dir.path().join("gdt"), "VITA", "PRAX");

        let names: Vec<String> = (0..5)
            .map(|_| emitter.emit(&ecg(), "1", None, None).unwrap().gdt_file_name)
            .collect();
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
