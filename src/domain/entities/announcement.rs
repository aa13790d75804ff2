use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    AsRefStr,
    Display,
    EnumString,
)]
#[sqlx(type_name = "announcement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AnnouncementStatus {
    Active,
    Paused,
}

/// A metered announcement banner. Banner CRUD lives elsewhere; this service
/// only reads banners and bumps their view counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub shop: String,
    pub name: String,
    pub status: AnnouncementStatus,
    pub views: i64,
    /// Per-banner cap overriding the plan default; `None` defers to the plan.
    pub view_limit: Option<i64>,
    /// Opaque styling/scheduling blob owned by the banner editor.
    pub settings: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
