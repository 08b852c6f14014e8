/// Identity provider webhook: mirrors newly created users into the store
use crate::error::{AppError, Result};
use crate::services::{UserService, WebhookEvent};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use crypto_core::WebhookHeaders;
use serde_json::json;

pub const HEADER_ID: &str = "svix-id";
pub const HEADER_TIMESTAMP: &str = "svix-timestamp";
pub const HEADER_SIGNATURE: &str = "svix-signature";

/// The signature covers the raw body, so it is taken as bytes
pub async fn register_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let verifier = state.webhooks.as_ref().ok_or_else(|| {
        AppError::Internal("Webhook secret is not configured".to_string())
    })?;

    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
    };
    let (Some(id), Some(timestamp), Some(signature)) = (
        header(HEADER_ID),
        header(HEADER_TIMESTAMP),
        header(HEADER_SIGNATURE),
    ) else {
        return Err(AppError::InvalidInput(
            "Error Occurred --no SVIX headers found!".to_string(),
        ));
    };

    verifier
        .verify(
            &WebhookHeaders {
                id,
                timestamp,
                signature,
            },
            &body,
        )
        .map_err(|err| {
            tracing::warn!(webhook_id = %id, error = %err, "webhook verification failed");
            AppError::InvalidInput("Error Occurred in webhooks verification!".to_string())
        })?;

    let event: WebhookEvent = serde_json::from_slice(&body)?;
    tracing::info!(webhook_id = %id, event_type = %event.event_type, "webhook received");

    UserService::new(state.store.clone())
        .register_from_webhook(event)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Webhook Received Successfully",
        "success": true,
    })))
}
