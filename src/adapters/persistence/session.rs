use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_lifecycle::SessionRepo,
};

/// Sessions are written by the install/OAuth flow outside this service; we
/// only ever read the freshest offline token for a shop.
#[async_trait]
impl SessionRepo for PostgresPersistence {
    async fn find_access_token(&self, shop: &str) -> AppResult<Option<String>> {
        let token: Option<String> = sqlx::query_scalar(
            r#"
            SELECT access_token
            FROM sessions
            WHERE shop = $1 AND access_token IS NOT NULL
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(shop)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(token)
    }
}
