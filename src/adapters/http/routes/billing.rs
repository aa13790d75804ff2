use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    domain::entities::{billing_record::BillingRecord, plan::PlanResolution},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/activate", get(activate))
        .route("/status", get(status))
        .route("/subscriptions", get(subscriptions))
        .route("/cancel", post(cancel))
}

#[derive(Deserialize)]
struct SubscribeRequest {
    shop: String,
    plan: String,
}

#[derive(Serialize)]
struct SubscribeResponse {
    confirmation_url: String,
}

/// POST /api/billing/subscribe
/// Starts checkout; the merchant approves at the returned URL.
async fn subscribe(
    State(app_state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> AppResult<impl IntoResponse> {
    let created = app_state.lifecycle.subscribe(&req.shop, &req.plan).await?;
    Ok(Json(SubscribeResponse {
        confirmation_url: created.confirmation_url,
    }))
}

#[derive(Deserialize)]
struct ActivateQuery {
    #[serde(default)]
    shop: String,
    #[serde(default)]
    charge_id: String,
}

/// GET /api/billing/activate?shop=&charge_id=
/// The merchant-approval return callback.
async fn activate(
    State(app_state): State<AppState>,
    Query(query): Query<ActivateQuery>,
) -> AppResult<impl IntoResponse> {
    let record = app_state
        .lifecycle
        .activate_charge(&query.shop, &query.charge_id)
        .await?;
    Ok(Json(record))
}

#[derive(Deserialize)]
struct ShopQuery {
    #[serde(default)]
    shop: String,
}

#[derive(Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    resolution: PlanResolution,
    billing: Option<BillingRecord>,
}

/// GET /api/billing/status?shop=
/// Effective plan plus the current billing record. The live provider check
/// inside `plan_overview` is best effort.
async fn status(
    State(app_state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> AppResult<impl IntoResponse> {
    if query.shop.is_empty() {
        return Err(AppError::Validation("Missing shop".into()));
    }
    let (resolution, billing) = app_state.lifecycle.plan_overview(&query.shop).await?;
    Ok(Json(StatusResponse {
        resolution,
        billing,
    }))
}

/// GET /api/billing/subscriptions?shop=
/// Live subscriptions as the provider reports them.
async fn subscriptions(
    State(app_state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> AppResult<impl IntoResponse> {
    let subs = app_state.lifecycle.active_subscriptions(&query.shop).await?;
    Ok(Json(serde_json::json!({ "subscriptions": subs })))
}

#[derive(Deserialize)]
struct CancelRequest {
    shop: String,
    subscription_id: String,
}

/// POST /api/billing/cancel
async fn cancel(
    State(app_state): State<AppState>,
    Json(req): Json<CancelRequest>,
) -> AppResult<impl IntoResponse> {
    let summary = app_state
        .lifecycle
        .cancel(&req.shop, &req.subscription_id)
        .await?;
    Ok(Json(serde_json::json!({ "status": summary.status })))
}
