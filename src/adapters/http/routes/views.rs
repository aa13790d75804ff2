use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(record_view))
        .route("/total", get(total_views))
}

#[derive(Deserialize)]
struct RecordViewRequest {
    banner_id: Uuid,
}

/// POST /api/views
/// Reports one impression. Fails closed: if metering breaks for any reason
/// other than an unknown banner, the widget is told to hide rather than
/// serving an uncounted view.
async fn record_view(
    State(app_state): State<AppState>,
    Json(req): Json<RecordViewRequest>,
) -> AppResult<impl IntoResponse> {
    match app_state.metering.record_view(req.banner_id).await {
        Ok(outcome) => Ok(Json(serde_json::json!(outcome))),
        Err(AppError::NotFound) => Err(AppError::NotFound),
        Err(err) => {
            tracing::error!(banner_id = %req.banner_id, error = %err, "Metering failed, hiding banner");
            Ok(Json(serde_json::json!({ "hide_banner": true })))
        }
    }
}

#[derive(Deserialize)]
struct TotalQuery {
    #[serde(default)]
    shop: String,
}

/// GET /api/views/total?shop=
async fn total_views(
    State(app_state): State<AppState>,
    Query(query): Query<TotalQuery>,
) -> AppResult<impl IntoResponse> {
    let total = app_state.metering.total_views(&query.shop).await?;
    Ok(Json(serde_json::json!({
        "shop": query.shop,
        "total_views": total,
    })))
}
