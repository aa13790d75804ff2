use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_api::{
        ActiveSubscription, BillingApiPort, ChargeStatus, CreatedCharge,
    },
    application::use_cases::plan_resolver::resolve_plan,
    domain::entities::{
        billing_record::{BillingRecord, BillingStatus},
        plan::{PlanConfig, PlanResolution},
        webhook::{BillingEvent, RemoteStatus},
    },
};

/// Length of one paid period.
pub const PAID_PERIOD_DAYS: i64 = 30;

/// Input for appending a new current record for a shop.
#[derive(Debug, Clone)]
pub struct NewBillingRecord {
    pub shop: String,
    pub charge_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_name: Option<String>,
    pub price: Option<f64>,
    pub billing_on: Option<DateTime<Utc>>,
    pub trial_ends_on: Option<DateTime<Utc>>,
    pub plan_expires_on: Option<DateTime<Utc>>,
    pub status: BillingStatus,
}

/// Partial update applied during webhook reconciliation.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate {
    pub status: BillingStatus,
    pub subscription_id: Option<String>,
    pub plan_expires_on: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait BillingRecordRepo: Send + Sync {
    /// The record the current-pointer designates for this shop, if any.
    async fn current_for_shop(&self, shop: &str) -> AppResult<Option<BillingRecord>>;

    /// Append a new record, mark prior non-terminal records `replaced`, and
    /// repoint the shop's current pointer. Atomic.
    async fn insert_as_current(&self, input: &NewBillingRecord) -> AppResult<BillingRecord>;

    async fn set_status(&self, id: Uuid, status: BillingStatus) -> AppResult<()>;

    async fn apply_update(&self, id: Uuid, update: &SubscriptionUpdate) -> AppResult<()>;

    /// Cancel every non-terminal record carrying this charge id. Returns the
    /// number of rows touched (zero is fine; duplicates are no-ops).
    async fn cancel_by_charge_id(&self, shop: &str, charge_id: &str) -> AppResult<u64>;

    /// Full append-only history for a shop, newest first.
    async fn history_for_shop(&self, shop: &str) -> AppResult<Vec<BillingRecord>>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Most recently refreshed offline access token for a shop.
    async fn find_access_token(&self, shop: &str) -> AppResult<Option<String>>;
}

/// Outcome of a merchant-initiated cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct CancelSummary {
    pub status: BillingStatus,
}

/// Drives the billing state machine for a shop: checkout, activation on the
/// approval callback, webhook reconciliation and cancellation.
pub struct SubscriptionLifecycle {
    records: Arc<dyn BillingRecordRepo>,
    sessions: Arc<dyn SessionRepo>,
    billing_api: Arc<dyn BillingApiPort>,
    app_origin: String,
}

impl SubscriptionLifecycle {
    pub fn new(
        records: Arc<dyn BillingRecordRepo>,
        sessions: Arc<dyn SessionRepo>,
        billing_api: Arc<dyn BillingApiPort>,
        app_origin: String,
    ) -> Self {
        Self {
            records,
            sessions,
            billing_api,
            app_origin,
        }
    }

    async fn access_token(&self, shop: &str) -> AppResult<String> {
        self.sessions
            .find_access_token(shop)
            .await?
            .ok_or(AppError::Auth)
    }

    /// Start checkout for a catalog plan. The merchant finishes at the
    /// returned confirmation URL; approval lands on `activate_charge`.
    pub async fn subscribe(&self, shop: &str, plan_name: &str) -> AppResult<CreatedCharge> {
        if shop.is_empty() {
            return Err(AppError::Validation("Missing shop".into()));
        }
        let plan = PlanConfig::by_name(plan_name)
            .ok_or_else(|| AppError::Validation(format!("Unknown plan: {plan_name}")))?;

        let token = self.access_token(shop).await?;
        let return_url = format!(
            "{}/api/billing/activate?shop={}",
            self.app_origin.trim_end_matches('/'),
            shop
        );

        let created = self
            .billing_api
            .create_charge(shop, &token, plan, &return_url)
            .await?;
        tracing::info!(shop, plan = plan.name, "Created subscription charge");
        Ok(created)
    }

    /// Merchant-approval callback: fetch the charge, activate it if the
    /// provider still holds it as accepted, and persist the new current
    /// record (replacing any prior subscription).
    pub async fn activate_charge(&self, shop: &str, charge_id: &str) -> AppResult<BillingRecord> {
        if shop.is_empty() {
            return Err(AppError::Validation("Missing shop".into()));
        }
        // The approval redirect sometimes carries literal "undefined" from
        // the embedded frontend; treat it like an absent id.
        if charge_id.is_empty() || charge_id == "undefined" || charge_id == "null" {
            return Err(AppError::Validation("Missing charge_id".into()));
        }

        let token = self.access_token(shop).await?;
        let charge = self.billing_api.get_charge(shop, &token, charge_id).await?;

        if charge.status == ChargeStatus::Accepted {
            self.billing_api
                .activate_charge(shop, &token, charge_id)
                .await?;
        } else if !charge.status.is_activatable() {
            return Err(AppError::Validation(format!(
                "Charge {charge_id} is {} and cannot be activated",
                charge.status
            )));
        }

        let billing_on = charge.created_at.ok_or_else(|| {
            AppError::Validation("Charge has no creation timestamp".into())
        })?;
        let trial_ends_on = billing_on + Duration::days(i64::from(charge.trial_days));
        let plan_expires_on = trial_ends_on + Duration::days(PAID_PERIOD_DAYS);

        let now = Utc::now();
        let status = if charge.trial_days > 0 && now < trial_ends_on {
            BillingStatus::Pending
        } else {
            BillingStatus::Active
        };

        let record = self
            .records
            .insert_as_current(&NewBillingRecord {
                shop: shop.to_string(),
                charge_id: Some(charge.id.clone()),
                subscription_id: None,
                plan_name: charge.name.clone(),
                price: charge.price,
                billing_on: Some(billing_on),
                trial_ends_on: Some(trial_ends_on),
                plan_expires_on: Some(plan_expires_on),
                status,
            })
            .await?;

        tracing::info!(
            shop,
            charge_id,
            status = %record.status,
            "Activated subscription charge"
        );
        Ok(record)
    }

    /// Apply a decoded webhook event. Idempotent: replaying any event leaves
    /// the store unchanged, and unknown topics are acknowledged quietly.
    pub async fn reconcile_webhook(&self, shop: &str, event: &BillingEvent) -> AppResult<()> {
        match event {
            BillingEvent::Unknown { topic } => {
                tracing::warn!(shop, topic, "Ignoring unhandled webhook topic");
                Ok(())
            }
            BillingEvent::RecurringChargeUpdate { charge_id, status } => {
                self.reconcile_charge_update(shop, charge_id, status).await
            }
            BillingEvent::SubscriptionUpdate {
                subscription_id,
                name,
                status,
            } => {
                self.reconcile_subscription_update(
                    shop,
                    subscription_id.as_deref(),
                    name.as_deref(),
                    status,
                )
                .await
            }
        }
    }

    async fn reconcile_charge_update(
        &self,
        shop: &str,
        charge_id: &str,
        status: &str,
    ) -> AppResult<()> {
        match status.parse::<RemoteStatus>() {
            Ok(RemoteStatus::Cancelled) => {
                let touched = self.records.cancel_by_charge_id(shop, charge_id).await?;
                tracing::info!(shop, charge_id, touched, "Charge cancelled via webhook");
                Ok(())
            }
            Ok(other) => {
                tracing::debug!(shop, charge_id, status = %other, "Charge update needs no action");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(shop, charge_id, status, "Unrecognized charge status");
                Ok(())
            }
        }
    }

    async fn reconcile_subscription_update(
        &self,
        shop: &str,
        subscription_id: Option<&str>,
        name: Option<&str>,
        status: &str,
    ) -> AppResult<()> {
        let Some(current) = self.records.current_for_shop(shop).await? else {
            tracing::debug!(shop, "Subscription update for shop with no billing record");
            return Ok(());
        };

        let remote = match status.parse::<RemoteStatus>() {
            Ok(s) => s,
            Err(_) => {
                tracing::warn!(shop, status, "Unrecognized subscription status");
                return Ok(());
            }
        };

        match remote {
            RemoteStatus::Cancelled => {
                if current.status.can_transition_to(BillingStatus::Cancelled) {
                    self.records
                        .set_status(current.id, BillingStatus::Cancelled)
                        .await?;
                    tracing::info!(shop, record_id = %current.id, "Subscription cancelled via webhook");
                } else {
                    tracing::debug!(shop, status = %current.status, "Duplicate cancel, no action");
                }
                Ok(())
            }
            RemoteStatus::Active => {
                let same_subscription = match (subscription_id, current.subscription_id.as_deref())
                {
                    (Some(incoming), Some(stored)) => incoming == stored,
                    // No ids to compare; fall back to plan-name equality
                    _ => name.is_some() && name == current.plan_name.as_deref(),
                };

                if current.status == BillingStatus::Active && same_subscription {
                    tracing::debug!(shop, "Subscription update matches stored state");
                    return Ok(());
                }

                if current.status == BillingStatus::Active
                    || current.status.can_transition_to(BillingStatus::Active)
                {
                    // Either a pending record whose trial the provider has
                    // confirmed, or a drifted record self-healing to active.
                    let update = SubscriptionUpdate {
                        status: BillingStatus::Active,
                        subscription_id: subscription_id.map(str::to_string),
                        plan_expires_on: Some(Utc::now() + Duration::days(PAID_PERIOD_DAYS)),
                    };
                    self.records.apply_update(current.id, &update).await?;
                    tracing::info!(shop, record_id = %current.id, "Subscription confirmed active");
                } else {
                    tracing::debug!(
                        shop,
                        status = %current.status,
                        "Active report for non-promotable record, no action"
                    );
                }
                Ok(())
            }
            other => {
                tracing::debug!(shop, status = %other, "Subscription update needs no action");
                Ok(())
            }
        }
    }

    /// Merchant-initiated cancellation. The remote mutation runs first; the
    /// local record only moves to `scheduled_cancelled` once the provider
    /// accepted the cancellation.
    pub async fn cancel(&self, shop: &str, subscription_id: &str) -> AppResult<CancelSummary> {
        if shop.is_empty() || subscription_id.is_empty() {
            return Err(AppError::Validation("Missing shop or subscription_id".into()));
        }

        let current = self
            .records
            .current_for_shop(shop)
            .await?
            .filter(|r| matches!(r.status, BillingStatus::Active | BillingStatus::Pending))
            .ok_or(AppError::NotFound)?;

        let token = self.access_token(shop).await?;
        let outcome = self
            .billing_api
            .cancel_subscription(shop, &token, subscription_id)
            .await?;

        if !outcome.user_errors.is_empty() {
            return Err(AppError::Upstream {
                message: "Cancellation rejected by billing provider".into(),
                user_errors: outcome.user_errors,
            });
        }

        self.records
            .set_status(current.id, BillingStatus::ScheduledCancelled)
            .await?;
        tracing::info!(shop, subscription_id, "Subscription scheduled for cancellation");

        Ok(CancelSummary {
            status: BillingStatus::ScheduledCancelled,
        })
    }

    /// Live subscriptions as the provider currently sees them.
    pub async fn active_subscriptions(&self, shop: &str) -> AppResult<Vec<ActiveSubscription>> {
        if shop.is_empty() {
            return Err(AppError::Validation("Missing shop".into()));
        }
        let token = self.access_token(shop).await?;
        self.billing_api.query_active_subscriptions(shop, &token).await
    }

    /// Resolve the shop's effective plan. The live provider check is best
    /// effort: if it fails, resolution proceeds on local state alone and the
    /// shop degrades toward `Free` rather than erroring.
    pub async fn plan_overview(
        &self,
        shop: &str,
    ) -> AppResult<(PlanResolution, Option<BillingRecord>)> {
        let record = self.records.current_for_shop(shop).await?;

        let live = match self.active_subscriptions(shop).await {
            Ok(subs) => Some(subs),
            Err(err) => {
                tracing::warn!(shop, error = %err, "Live subscription check failed, using local state");
                None
            }
        };

        let resolution = resolve_plan(Utc::now(), record.as_ref(), live.as_deref());
        Ok((resolution, record))
    }
}
