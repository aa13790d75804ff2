use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::app_error::{AppError, AppResult};

/// Subscription status as reported by the billing provider. Webhook payloads
/// use upper-case strings ("ACTIVE", "CANCELLED"), REST responses lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RemoteStatus {
    Pending,
    Accepted,
    Active,
    Declined,
    Expired,
    Cancelled,
    Frozen,
}

/// A billing webhook, decoded into a typed event at the ingress boundary.
/// Handlers never see raw payload JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    SubscriptionUpdate {
        subscription_id: Option<String>,
        name: Option<String>,
        status: String,
    },
    RecurringChargeUpdate {
        charge_id: String,
        status: String,
    },
    /// Topic this service does not handle. Acknowledged and ignored.
    Unknown { topic: String },
}

const TOPIC_SUBSCRIPTION_UPDATE: &str = "app_subscriptions/update";
const TOPIC_RECURRING_CHARGE_UPDATE: &str = "recurring_application_charges/update";

impl BillingEvent {
    pub fn decode(topic: &str, payload: &Value) -> AppResult<BillingEvent> {
        match topic {
            TOPIC_SUBSCRIPTION_UPDATE => {
                let sub = payload.get("app_subscription").ok_or_else(|| {
                    AppError::Validation("Missing app_subscription in payload".into())
                })?;
                let status = sub.get("status").and_then(Value::as_str).ok_or_else(|| {
                    AppError::Validation("Missing app_subscription.status".into())
                })?;
                Ok(BillingEvent::SubscriptionUpdate {
                    subscription_id: sub
                        .get("admin_graphql_api_id")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    name: sub.get("name").and_then(Value::as_str).map(str::to_string),
                    status: status.to_string(),
                })
            }
            TOPIC_RECURRING_CHARGE_UPDATE => {
                let charge = payload.get("recurring_application_charge").ok_or_else(|| {
                    AppError::Validation("Missing recurring_application_charge in payload".into())
                })?;
                // Charge ids arrive as JSON numbers
                let charge_id = charge
                    .get("id")
                    .and_then(|v| match v {
                        Value::Number(n) => Some(n.to_string()),
                        Value::String(s) => Some(s.clone()),
                        _ => None,
                    })
                    .ok_or_else(|| {
                        AppError::Validation("Missing recurring_application_charge.id".into())
                    })?;
                let status = charge.get("status").and_then(Value::as_str).ok_or_else(|| {
                    AppError::Validation("Missing recurring_application_charge.status".into())
                })?;
                Ok(BillingEvent::RecurringChargeUpdate {
                    charge_id,
                    status: status.to_string(),
                })
            }
            other => Ok(BillingEvent::Unknown {
                topic: other.to_string(),
            }),
        }
    }
}
