use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Monthly view cap for shops on the free tier.
pub const FREE_VIEW_LIMIT: i64 = 500;
/// Monthly view cap while a trial is running.
pub const TRIAL_VIEW_LIMIT: i64 = 100;

/// Effective plan for a shop, derived fresh on every query and never stored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Plan {
    Free,
    Trial,
    Premium,
    /// Record exists but the paid state is not confirmed: either the trial is
    /// still running, or the subscription was cancelled and the paid period
    /// has not ended yet.
    Pending,
    Cancelled,
}

/// Result of plan resolution for one shop at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanResolution {
    pub plan: Plan,
    pub is_trial_active: bool,
    /// Whole days until the governing boundary (ceiling, floored at 0);
    /// `None` when no boundary applies.
    pub days_left: Option<i64>,
}

impl PlanResolution {
    /// Default banner view cap for this resolution. `None` means unlimited.
    /// A pending subscription inside its trial gets the trial cap; a pending
    /// subscription in its paid grace window is not throttled.
    pub fn view_limit(&self) -> Option<i64> {
        match self.plan {
            Plan::Premium => None,
            Plan::Trial => Some(TRIAL_VIEW_LIMIT),
            Plan::Pending => {
                if self.is_trial_active {
                    Some(TRIAL_VIEW_LIMIT)
                } else {
                    None
                }
            }
            Plan::Free | Plan::Cancelled => Some(FREE_VIEW_LIMIT),
        }
    }
}

/// A purchasable plan. The catalog is fixed at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanConfig {
    pub name: &'static str,
    pub price: f64,
    pub currency_code: &'static str,
    pub interval: &'static str,
    pub trial_days: i32,
}

const PLAN_CATALOG: &[PlanConfig] = &[PlanConfig {
    name: "Premium",
    price: 499.0,
    currency_code: "INR",
    interval: "EVERY_30_DAYS",
    trial_days: 1,
}];

impl PlanConfig {
    /// Look up a purchasable plan by name (case-sensitive, matching the
    /// names the checkout flow submits).
    pub fn by_name(name: &str) -> Option<&'static PlanConfig> {
        PLAN_CATALOG.iter().find(|p| p.name == name)
    }
}
