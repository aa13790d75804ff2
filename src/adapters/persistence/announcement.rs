use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::view_metering::AnnouncementRepo,
    domain::entities::announcement::Announcement,
};

fn row_to_announcement(row: &sqlx::postgres::PgRow) -> Announcement {
    Announcement {
        id: row.get("id"),
        shop: row.get("shop"),
        name: row.get("name"),
        status: row.get("status"),
        views: row.get("views"),
        view_limit: row.get("view_limit"),
        settings: row.get("settings"),
        created_at: row.get("created_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, shop, name, status, views, view_limit, settings, created_at
"#;

#[async_trait]
impl AnnouncementRepo for PostgresPersistence {
    async fn get(&self, id: Uuid) -> AppResult<Option<Announcement>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM announcements WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_announcement))
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<i64> {
        let views: i64 =
            sqlx::query_scalar("UPDATE announcements SET views = views + 1 WHERE id = $1 RETURNING views")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)?;
        Ok(views)
    }

    async fn sum_views_by_shop(&self, shop: &str) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(views), 0)::BIGINT FROM announcements WHERE shop = $1",
        )
        .bind(shop)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(total)
    }
}
