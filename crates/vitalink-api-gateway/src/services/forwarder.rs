//! HTTP client for the clinical emitter.

use crate::models::{ClinicalStatus, ForwardPayload, ProcessResponse};
use std::time::Duration;
use thiserror::Error;

/// Failure modes of the downstream call.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The emitter was unreachable or the request timed out. The
    /// idempotency cache must not be populated for this outcome so the
    /// client can retry with the same key.
    #[error("Clinical emitter unreachable: {0}")]
    Transport(String),

    /// The emitter answered with a non-2xx status.
    #[error("Clinical emitter returned HTTP {0}")]
    BadStatus(u16),

    /// The emitter answered 2xx but the body did not parse.
    #[error("Clinical emitter returned an unparseable body: {0}")]
    BadBody(String),
}

/// Client for the emitter's process and status endpoints.
pub struct ClinicalForwarder {
    base_url: String,
    http_client: reqwest::Client,
}

impl ClinicalForwarder {
    /// Create a forwarder with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ForwardError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ForwardError::Transport(format!("client construction failed: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// POST the exact `payload_json` bytes to the process endpoint.
    ///
    /// The caller serializes the payload once and hashes those same bytes
    /// for the audit trail.
    pub async fn process(&self, payload_json: String) -> Result<ProcessResponse, ForwardError> {
        let url = format!("{}/api/v1/process", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload_json)
            .send()
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardError::BadStatus(status.as_u16()));
        }

        response
            .json::<ProcessResponse>()
            .await
            .map_err(|e| ForwardError::BadBody(e.to_string()))
    }

    /// Fetch the emitter's status for a subject. `Ok(None)` means the
    /// subject has no recorded transfers (404 downstream).
    pub async fn status(&self, patient_id: &str) -> Result<Option<ClinicalStatus>, ForwardError> {
        let url = format!("{}/api/v1/status/{patient_id}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ForwardError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ForwardError::BadStatus(response.status().as_u16()));
        }

        response
            .json::<ClinicalStatus>()
            .await
            .map(Some)
            .map_err(|e| ForwardError::BadBody(e.to_string()))
    }
}

impl std::fmt::Debug for ClinicalForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClinicalForwarder")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Build a [`ForwardPayload`] serialized exactly once; both the wire body
/// and the audit hash come from the returned string.
pub fn serialize_payload(payload: &ForwardPayload) -> Result<String, serde_json::Error> {
    serde_json::to_string(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payload() -> ForwardPayload {
        ForwardPayload {
            patient_id: "1".into(),
            patient_first_name: Some("Max".into()),
            patient_last_name: Some("Mustermann".into()),
            patient_date_of_birth: Some("1990-01-15".into()),
            observations: vec![serde_json::json!({"resourceType": "Observation"})],
        }
    }

    #[tokio::test]
    async fn process_round_trip() {
        let server = MockServer::start().await;
        let body = serialize_payload(&payload()).unwrap();
        Mock::given(method("POST"))
            .and(path("/api/v1/process"))
            .and(body_json_string(body.clone()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "totalProcessed": 1,
                "successful": 1,
                "failed": 0,
                "results": [{"status": "success", "gdtFileName": "obs_1.gdt"}]
            })))
            .mount(&server)
            .await;

        let forwarder =
            ClinicalForwarder::new(server.uri(), Duration::from_secs(10)).unwrap();
        let response = forwarder.process(body).await.unwrap();
        assert_eq!(response.status, "success");
        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.results[0].gdt_file_name.as_deref(),
            Some("obs_1.gdt")
        );
    }

    #[tokio::test]
    async fn non_2xx_is_bad_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/process"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let forwarder =
            ClinicalForwarder::new(server.uri(), Duration::from_secs(10)).unwrap();
        let err = forwarder
            .process(serialize_payload(&payload()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::BadStatus(503)));
    }

    #[tokio::test]
    async fn unparseable_2xx_is_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/process"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let forwarder =
            ClinicalForwarder::new(server.uri(), Duration::from_secs(10)).unwrap();
        let err = forwarder
            .process(serialize_payload(&payload()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::BadBody(_)));
    }

    #[tokio::test]
    async fn status_404_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/status/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let forwarder =
            ClinicalForwarder::new(server.uri(), Duration::from_secs(10)).unwrap();
        assert!(forwarder.status("9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/process"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let forwarder =
            ClinicalForwarder::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = forwarder
            .process(serialize_payload(&payload()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)));
    }
}
