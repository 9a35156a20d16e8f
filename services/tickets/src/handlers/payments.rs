use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;

use crate::error::TicketsServiceError;
use crate::state::AppState;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// `POST /webhooks/payments`. Anything other than a signature failure or an
/// infrastructure error is acknowledged with 200 so the provider stops retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, TicketsServiceError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = state.apply_webhook().execute(&body, signature).await?;
    Ok(Json(WebhookResponse {
        status: outcome.status(),
    }))
}
