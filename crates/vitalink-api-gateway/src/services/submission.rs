//! The submission pipeline: decode, normalize, forward, aggregate, audit,
//! cache.

use crate::context::AuthContext;
use crate::error::GatewayError;
use crate::models::{EntryResult, ForwardPayload, SubmissionResult};
use crate::router::GatewayState;
use crate::services::forwarder::serialize_payload;
use sha2::{Digest, Sha256};
use vitalink_fhir::{normalize_observation, Bundle};

/// Outcome of one submission, carrying the canonical response bytes.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// The exact JSON body to return (and replay).
    pub response_json: String,
    /// Whether this was an idempotent replay of a prior submission.
    pub replay: bool,
}

/// Run the full submission pipeline for an authenticated caller.
///
/// A replay hit short-circuits before any forwarding. A fresh submission
/// is forwarded to the emitter, audited with the SHA-256 of the exact
/// forwarded bytes, and cached under `(key, subject)`. When the emitter
/// never produced a definitive answer (transport error, timeout,
/// non-2xx) the cache stays empty so the caller may retry with the same
/// key.
pub async fn handle_submission(
    state: &GatewayState,
    context: &AuthContext,
    idempotency_key: &str,
    bundle: &Bundle,
) -> Result<SubmissionOutcome, GatewayError> {
    if let Some(cached) = state.idempotency.get(idempotency_key, &context.subject)? {
        tracing::info!(subject = %context.subject, key = idempotency_key, "Idempotent replay");
        return Ok(SubmissionOutcome {
            response_json: cached,
            replay: true,
        });
    }

    let decoded = bundle.observations();
    if decoded.is_empty() {
        return Err(GatewayError::Validation(
            "bundle contains no entries".to_string(),
        ));
    }

    // Normalize the decodable observations; remember the per-entry decode
    // failures so one bad entry never aborts its peers.
    let mut forwarded = Vec::new();
    let mut slots: Vec<Result<(), String>> = Vec::with_capacity(decoded.len());
    for entry in decoded {
        match entry {
            Ok(mut observation) => {
                normalize_observation(&mut observation);
                let value = serde_json::to_value(&observation)
                    .map_err(|e| GatewayError::Internal(format!("re-encode failed: {e}")))?;
                forwarded.push(value);
                slots.push(Ok(()));
            }
            Err(reason) => slots.push(Err(reason)),
        }
    }

    let payload = ForwardPayload {
        patient_id: vitalink_core::PatientId::new(context.subject.clone()),
        patient_first_name: context.given_name.clone(),
        patient_last_name: context.family_name.clone(),
        patient_date_of_birth: context.birth_date.clone(),
        observations: forwarded,
    };
    let payload_json =
        serialize_payload(&payload).map_err(|e| GatewayError::Internal(e.to_string()))?;
    let payload_hash = hex::encode(Sha256::digest(payload_json.as_bytes()));

    let (results, definitive) = if payload.observations.is_empty() {
        // Nothing decodable: a definitive all-failed outcome, no call out.
        (fill_results(&slots, Vec::new()), true)
    } else {
        match state.forwarder.process(payload_json).await {
            Ok(response) => (fill_results(&slots, response.results), true),
            Err(err) => {
                tracing::warn!(error = %err, "Forwarding to clinical emitter failed");
                let failed: Vec<EntryResult> = slots
                    .iter()
                    .map(|slot| match slot {
                        Ok(()) => EntryResult::failed(err.to_string()),
                        Err(reason) => EntryResult::failed(reason.clone()),
                    })
                    .collect();
                // The emitter produced no definitive outcome; leave the
                // cache empty so the client can retry with the same key.
                (failed, false)
            }
        }
    };

    let result = SubmissionResult::from_entries(idempotency_key, results);
    let response_json =
        serde_json::to_string(&result).map_err(|e| GatewayError::Internal(e.to_string()))?;

    state.audit.submission(
        &context.subject,
        idempotency_key,
        &payload_hash,
        &result.status,
        result.total_processed,
    );

    let response_json = if definitive {
        // First writer wins; a concurrent attempt gets the winner's body.
        state
            .idempotency
            .put(idempotency_key, &context.subject, &response_json)?
    } else {
        response_json
    };

    Ok(SubmissionOutcome {
        response_json,
        replay: false,
    })
}

/// Interleave the emitter's results back into bundle-entry order, keeping
/// local decode failures in their slots.
fn fill_results(slots: &[Result<(), String>], downstream: Vec<EntryResult>) -> Vec<EntryResult> {
    let mut downstream = downstream.into_iter();
    slots
        .iter()
        .map(|slot| match slot {
            Ok(()) => downstream
                .next()
                .unwrap_or_else(|| EntryResult::failed("missing result from clinical emitter")),
            Err(reason) => EntryResult::failed(reason.clone()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_results_keeps_entry_order() {
        let slots = vec![
            Ok(()),
            Err("unsupported resource type 'Patient'".to_string()),
            Ok(()),
        ];
        let downstream = vec![
            EntryResult {
                status: "success".into(),
                gdt_file_name: Some("a.gdt".into()),
                warnings: vec![],
                error: None,
            },
            EntryResult::failed("mapping failed"),
        ];

        let results = fill_results(&slots, downstream);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].gdt_file_name.as_deref(), Some("a.gdt"));
        assert_eq!(
            results[1].error.as_deref(),
            Some("unsupported resource type 'Patient'")
        );
        assert_eq!(results[2].error.as_deref(), Some("mapping failed"));
    }

    #[test]
    fn fill_results_tolerates_short_downstream() {
        let slots = vec![Ok(()), Ok(())];
        let results = fill_results(&slots, vec![]);
        assert!(results.iter().all(|r| r.status == "error"));
    }
}
