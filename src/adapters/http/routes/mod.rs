pub mod billing;
pub mod views;
pub mod webhooks;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing::router())
        .nest("/webhooks", webhooks::router())
        .nest("/views", views::router())
}

/// Bare router for HTTP-level tests, mounted the way production nests it.
#[cfg(test)]
pub fn build_test_router(app_state: AppState) -> Router {
    Router::new().nest("/api", router()).with_state(app_state)
}
