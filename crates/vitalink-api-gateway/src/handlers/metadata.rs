//! Unauthenticated metadata endpoint used by the mobile client to
//! bootstrap.

use crate::models::MetadataResponse;
use crate::router::GatewayState;
use axum::{extract::State, Json};

/// Returns the fixed bootstrap document.
pub async fn metadata_handler(State(state): State<GatewayState>) -> Json<MetadataResponse> {
    Json(MetadataResponse {
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        iam_discovery_url: state.iam_discovery_url.clone(),
        supported_resource_types: vec!["Observation".to_string()],
    })
}
