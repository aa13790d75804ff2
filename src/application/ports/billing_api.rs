use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{app_error::AppResult, domain::entities::plan::PlanConfig};

/// Status of a recurring application charge on the provider side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ChargeStatus {
    Pending,
    Accepted,
    Active,
    Declined,
    Expired,
    Cancelled,
    Frozen,
}

impl ChargeStatus {
    /// Whether an activation attempt can proceed from this status.
    pub fn is_activatable(&self) -> bool {
        matches!(self, ChargeStatus::Accepted | ChargeStatus::Active)
    }
}

/// A freshly created charge awaiting merchant approval.
#[derive(Debug, Clone)]
pub struct CreatedCharge {
    pub confirmation_url: String,
}

/// Snapshot of a recurring charge fetched from the provider.
#[derive(Debug, Clone)]
pub struct ChargeDetails {
    pub id: String,
    pub status: ChargeStatus,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub trial_days: i32,
    pub created_at: Option<DateTime<Utc>>,
}

/// One entry from the provider's active-subscription listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSubscription {
    pub id: String,
    pub name: String,
    pub status: String,
}

impl ActiveSubscription {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Result of a remote cancellation attempt.
#[derive(Debug, Clone, Default)]
pub struct CancelOutcome {
    pub status: Option<String>,
    pub user_errors: Vec<String>,
}

/// Outbound billing API. The lifecycle engine talks to the provider only
/// through this trait; production wires in the HTTP client, tests a mock.
#[async_trait]
pub trait BillingApiPort: Send + Sync {
    /// Create a recurring charge; the merchant approves it at the returned URL.
    async fn create_charge(
        &self,
        shop: &str,
        access_token: &str,
        plan: &PlanConfig,
        return_url: &str,
    ) -> AppResult<CreatedCharge>;

    async fn get_charge(
        &self,
        shop: &str,
        access_token: &str,
        charge_id: &str,
    ) -> AppResult<ChargeDetails>;

    async fn activate_charge(
        &self,
        shop: &str,
        access_token: &str,
        charge_id: &str,
    ) -> AppResult<()>;

    async fn query_active_subscriptions(
        &self,
        shop: &str,
        access_token: &str,
    ) -> AppResult<Vec<ActiveSubscription>>;

    async fn cancel_subscription(
        &self,
        shop: &str,
        access_token: &str,
        subscription_id: &str,
    ) -> AppResult<CancelOutcome>;
}
