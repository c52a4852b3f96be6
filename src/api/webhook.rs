use crate::api::error::ApiError;
use crate::state::AppState;
use crate::webhook::{WebhookError, SIGNATURE_HEADER};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use std::sync::Arc;
use tracing::debug;

const OPERATION: &str = "POST /webhooks/cdp";

// POST /webhooks/cdp handler
//
// The body is taken as raw bytes: the signature covers exactly what was
// sent, so it must be checked before any JSON decoding. A 200 is only
// returned once the ledger write (or the decision to skip it) is done; any
// failure or timeout is a 500 so the sender redelivers.
pub async fn cdp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let outcome = tokio::time::timeout(
        state.config.webhook_timeout,
        state.processor.handle(&body, signature),
    )
    .await
    .unwrap_or(Err(WebhookError::Timeout))
    .map_err(|e| ApiError::from(e).logged(OPERATION))?;

    debug!("Webhook acknowledged: {:?}", outcome);
    Ok(StatusCode::OK)
}
