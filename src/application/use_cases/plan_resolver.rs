use chrono::{DateTime, Utc};

use crate::{
    application::ports::billing_api::ActiveSubscription,
    domain::entities::{
        billing_record::{BillingRecord, BillingStatus},
        plan::{Plan, PlanResolution},
    },
};

const SECS_PER_DAY: i64 = 86_400;

/// Whole days until `boundary`, rounded up, never negative.
fn days_until(now: DateTime<Utc>, boundary: DateTime<Utc>) -> i64 {
    let secs = (boundary - now).num_seconds();
    ((secs + SECS_PER_DAY - 1) / SECS_PER_DAY).max(0)
}

/// Derive the shop's effective plan from the current billing record and an
/// optional live provider snapshot. Pure and total: no I/O, no clock reads,
/// and every combination of inputs resolves to something. Callers that fail
/// to fetch `live` pass `None` and the shop degrades toward `Free`.
pub fn resolve_plan(
    now: DateTime<Utc>,
    record: Option<&BillingRecord>,
    live: Option<&[ActiveSubscription]>,
) -> PlanResolution {
    let live_active = live.is_some_and(|subs| subs.iter().any(ActiveSubscription::is_active));

    // Premium requires both the provider and our store to agree.
    if live_active
        && let Some(record) = record
    {
        return PlanResolution {
            plan: Plan::Premium,
            is_trial_active: record.is_trial_active(now),
            days_left: record.plan_expires_on.map(|t| days_until(now, t)),
        };
    }

    let Some(record) = record else {
        return PlanResolution {
            plan: Plan::Free,
            is_trial_active: false,
            days_left: None,
        };
    };

    if record.within_entitlement_window(now) {
        let is_trial_active = record.is_trial_active(now);
        let boundary = if is_trial_active {
            record.trial_ends_on
        } else {
            record.plan_expires_on
        };
        return PlanResolution {
            plan: Plan::Pending,
            is_trial_active,
            days_left: boundary.map(|t| days_until(now, t)),
        };
    }

    if record.status == BillingStatus::Cancelled {
        return PlanResolution {
            plan: Plan::Cancelled,
            is_trial_active: false,
            days_left: None,
        };
    }

    // Stale record with no live confirmation and a closed window
    PlanResolution {
        plan: Plan::Free,
        is_trial_active: false,
        days_left: None,
    }
}
