use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Lifecycle status of a billing record.
/// Used as a state machine: transitions only move forward, and `cancelled` /
/// `replaced` are terminal.
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
#[sqlx(type_name = "billing_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BillingStatus {
    /// Charge approved but the trial window is still open
    Pending,
    /// Paid and confirmed
    Active,
    /// Merchant asked to cancel; access continues until the paid period ends
    ScheduledCancelled,
    /// Fully terminated
    Cancelled,
    /// Superseded by a newer subscription for the same shop
    Replaced,
}

impl BillingStatus {
    /// Whether this record can still change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BillingStatus::Cancelled | BillingStatus::Replaced)
    }

    /// Whether the record represents a live entitlement (ignoring time windows).
    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            BillingStatus::Pending | BillingStatus::Active | BillingStatus::ScheduledCancelled
        )
    }

    /// Valid transitions from this status. Webhooks may report a hard cancel
    /// without the scheduled step, so `cancelled` is reachable from every
    /// non-terminal status.
    pub fn valid_transitions(&self) -> &'static [BillingStatus] {
        match self {
            BillingStatus::Pending => &[
                BillingStatus::Active,
                BillingStatus::ScheduledCancelled,
                BillingStatus::Cancelled,
                BillingStatus::Replaced,
            ],
            BillingStatus::Active => &[
                BillingStatus::ScheduledCancelled,
                BillingStatus::Cancelled,
                BillingStatus::Replaced,
            ],
            BillingStatus::ScheduledCancelled => {
                &[BillingStatus::Cancelled, BillingStatus::Replaced]
            }
            BillingStatus::Cancelled | BillingStatus::Replaced => &[],
        }
    }

    /// Check if transition to the given status is valid.
    pub fn can_transition_to(&self, new_status: BillingStatus) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

/// One subscription lifetime for a shop. Rows are append-only: a new
/// subscription inserts a fresh record and marks the old ones `replaced`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    pub id: Uuid,
    pub shop: String,
    pub charge_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_name: Option<String>,
    pub price: Option<f64>,
    pub billing_on: Option<DateTime<Utc>>,
    pub trial_ends_on: Option<DateTime<Utc>>,
    pub plan_expires_on: Option<DateTime<Utc>>,
    pub status: BillingStatus,
    pub created_at: DateTime<Utc>,
}

impl BillingRecord {
    /// Whether the trial window is still open.
    pub fn is_trial_active(&self, now: DateTime<Utc>) -> bool {
        self.trial_ends_on.is_some_and(|t| now < t)
    }

    /// Whether `now` falls before either entitlement boundary. This is what
    /// keeps a cancelled subscription usable until the paid period runs out.
    pub fn within_entitlement_window(&self, now: DateTime<Utc>) -> bool {
        self.is_trial_active(now) || self.plan_expires_on.is_some_and(|t| now < t)
    }
}
