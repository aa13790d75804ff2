use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        plan_resolver::resolve_plan, subscription_lifecycle::BillingRecordRepo,
    },
    domain::entities::announcement::Announcement,
};

#[async_trait]
pub trait AnnouncementRepo: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<Announcement>>;

    /// Atomic `views = views + 1`, returning the new count.
    async fn increment_views(&self, id: Uuid) -> AppResult<i64>;

    async fn sum_views_by_shop(&self, shop: &str) -> AppResult<i64>;
}

/// What a storefront widget needs to know after reporting one impression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutcome {
    pub hide_banner: bool,
    pub current_views: i64,
    /// `None` means the plan places no cap on this banner.
    pub max_views: Option<i64>,
    pub total_shop_views: i64,
}

/// Meters banner impressions against the shop's plan. The cap is soft: the
/// over-cap check and the increment are separate statements, so concurrent
/// reports may overshoot by a few views, but an at-cap banner never writes.
pub struct ViewMetering {
    announcements: Arc<dyn AnnouncementRepo>,
    records: Arc<dyn BillingRecordRepo>,
}

impl ViewMetering {
    pub fn new(
        announcements: Arc<dyn AnnouncementRepo>,
        records: Arc<dyn BillingRecordRepo>,
    ) -> Self {
        Self {
            announcements,
            records,
        }
    }

    pub async fn record_view(&self, banner_id: Uuid) -> AppResult<ViewOutcome> {
        let banner = self
            .announcements
            .get(banner_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let limit = self.effective_limit(&banner).await?;

        // Already at or over the cap: answer without touching the counter so
        // replays cannot push the count further.
        if let Some(max) = limit
            && banner.views >= max
        {
            tracing::debug!(banner_id = %banner.id, shop = %banner.shop, views = banner.views, max, "Banner at view cap");
            return Ok(ViewOutcome {
                hide_banner: true,
                current_views: banner.views,
                max_views: limit,
                total_shop_views: self.announcements.sum_views_by_shop(&banner.shop).await?,
            });
        }

        let current_views = self.announcements.increment_views(banner.id).await?;
        let hide_banner = limit.is_some_and(|max| current_views >= max);

        Ok(ViewOutcome {
            hide_banner,
            current_views,
            max_views: limit,
            total_shop_views: self.announcements.sum_views_by_shop(&banner.shop).await?,
        })
    }

    pub async fn total_views(&self, shop: &str) -> AppResult<i64> {
        if shop.is_empty() {
            return Err(AppError::Validation("Missing shop".into()));
        }
        self.announcements.sum_views_by_shop(shop).await
    }

    /// Per-banner override wins; otherwise the plan default. Resolution uses
    /// local state only, metering never calls out to the provider.
    async fn effective_limit(&self, banner: &Announcement) -> AppResult<Option<i64>> {
        if banner.view_limit.is_some() {
            return Ok(banner.view_limit);
        }
        let record = self.records.current_for_shop(&banner.shop).await?;
        let resolution = resolve_plan(Utc::now(), record.as_ref(), None);
        Ok(resolution.view_limit())
    }
}
