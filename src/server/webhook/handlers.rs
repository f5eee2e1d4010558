use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{error, warn};

use super::signature::{SIGNATURE_HEADER, verify_signature};
use crate::ingest::{InboundEvent, IngestReport};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Accepts a GitHub delivery. Once the request is authentic and names an
/// event the answer is always 202, whatever ingestion managed to do.
pub async fn receive_github(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse<IngestReport>>), ApiError> {
    if let Some(secret) = state.webhook_secret.as_deref() {
        let signature = header_str(&headers, SIGNATURE_HEADER).unwrap_or_default();
        if verify_signature(&body, signature, secret).is_err() {
            warn!(
                delivery_id = header_str(&headers, DELIVERY_HEADER).unwrap_or_default(),
                "rejected webhook with invalid signature"
            );
            return Err(ApiError::unauthorized("Invalid webhook signature"));
        }
    }

    let event = header_str(&headers, EVENT_HEADER)
        .ok_or_else(|| ApiError::bad_request("Missing X-GitHub-Event header"))?;

    let inbound = InboundEvent {
        delivery_id: header_str(&headers, DELIVERY_HEADER)
            .unwrap_or_default()
            .to_string(),
        event: event.to_string(),
        action: String::new(),
        repo_full_name: String::new(),
        payload: body.to_vec(),
    };

    // Runs to completion even if the client goes away.
    let ingestor = state.ingestor.clone();
    let report = tokio::task::spawn_blocking(move || ingestor.ingest(&inbound))
        .await
        .map_err(|e| {
            error!(error = %e, "webhook ingestion task failed");
            ApiError::internal("Failed to ingest webhook")
        })?;

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(report))))
}
