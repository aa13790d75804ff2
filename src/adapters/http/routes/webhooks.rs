use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::webhook::BillingEvent,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}

/// Whether a reconciliation failure should make the provider retry the
/// delivery. Transient faults get a 5xx; everything else is acknowledged so
/// the provider stops resending a payload that will never apply.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::Storage(_) => true,
        AppError::Upstream { .. } => true,

        AppError::Validation(_) => false,
        AppError::Auth => false,
        AppError::NotFound => false,
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> AppResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Validation(format!("Missing {name} header")))
}

/// POST /api/webhooks/billing
/// Signature check runs over the raw body before anything is parsed.
async fn handle_billing_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let topic = required_header(&headers, "x-shopify-topic")?;
    let shop = required_header(&headers, "x-shopify-shop-domain")?;
    let signature = required_header(&headers, "x-shopify-hmac-sha256")?;

    app_state
        .webhook_verifier
        .verify(body.as_bytes(), signature)?;

    let payload: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {e}")))?;

    let event = BillingEvent::decode(topic, &payload)?;

    match app_state.lifecycle.reconcile_webhook(shop, &event).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(err) if is_retryable_error(&err) => {
            tracing::error!(shop, topic, error = %err, "Webhook reconciliation failed, asking for retry");
            Ok(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(err) => {
            tracing::warn!(shop, topic, error = %err, "Webhook dropped after non-retryable error");
            Ok(StatusCode::OK)
        }
    }
}
