//! Identity provider webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use cutout_core::IdentityEvent;

use crate::clerk;
use crate::error::ApiError;
use crate::identity;
use crate::state::AppState;

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
}

/// Handle Clerk identity webhooks.
///
/// Signature failures are fatal (400, the provider will not be asked to
/// retry a forgery). A verified event is acknowledged immediately; the
/// store reconciliation runs after the response, so a slow database can
/// never push the provider into timeout-redelivery.
pub async fn clerk_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.clerk_webhook_secret {
        clerk::verify_webhook(&headers, &body, secret).map_err(|e| {
            tracing::warn!(error = %e, "Invalid webhook signature");
            ApiError::BadRequest("Invalid webhook signature".into())
        })?;
    } else {
        // No secret configured - skip verification (development mode)
        tracing::warn!("Webhook secret not configured - skipping signature verification");
    }

    let event: IdentityEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        user_id = event.user_id().unwrap_or("<missing>"),
        "Received identity webhook"
    );

    // Ack first, reconcile after.
    tokio::spawn(async move {
        identity::process_event(&state, event).await;
    });

    Ok(Json(WebhookResponse { received: true }))
}
