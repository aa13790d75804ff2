//! In-memory mock implementations for the repository and billing-API traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_api::{
        ActiveSubscription, BillingApiPort, CancelOutcome, ChargeDetails, CreatedCharge,
    },
    application::use_cases::{
        subscription_lifecycle::{
            BillingRecordRepo, NewBillingRecord, SessionRepo, SubscriptionUpdate,
        },
        view_metering::AnnouncementRepo,
    },
    domain::entities::{
        announcement::Announcement,
        billing_record::{BillingRecord, BillingStatus},
        plan::PlanConfig,
    },
};

// ============================================================================
// InMemoryBillingRecordRepo
// ============================================================================

/// Append-only record map plus a shop -> record pointer, mirroring the
/// billing_records / billing_current table pair.
#[derive(Default)]
pub struct InMemoryBillingRecordRepo {
    pub records: Mutex<HashMap<Uuid, BillingRecord>>,
    pub current: Mutex<HashMap<String, Uuid>>,
}

impl InMemoryBillingRecordRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record and point the shop's current pointer at it.
    pub fn seed(&self, record: BillingRecord) {
        self.current
            .lock()
            .unwrap()
            .insert(record.shop.clone(), record.id);
        self.records.lock().unwrap().insert(record.id, record);
    }
}

#[async_trait]
impl BillingRecordRepo for InMemoryBillingRecordRepo {
    async fn current_for_shop(&self, shop: &str) -> AppResult<Option<BillingRecord>> {
        let current = self.current.lock().unwrap();
        let records = self.records.lock().unwrap();
        Ok(current.get(shop).and_then(|id| records.get(id)).cloned())
    }

    async fn insert_as_current(&self, input: &NewBillingRecord) -> AppResult<BillingRecord> {
        // Same lock order as current_for_shop
        let mut current = self.current.lock().unwrap();
        let mut records = self.records.lock().unwrap();
        for record in records.values_mut() {
            if record.shop == input.shop && !record.status.is_terminal() {
                record.status = BillingStatus::Replaced;
            }
        }

        let record = BillingRecord {
            id: Uuid::new_v4(),
            shop: input.shop.clone(),
            charge_id: input.charge_id.clone(),
            subscription_id: input.subscription_id.clone(),
            plan_name: input.plan_name.clone(),
            price: input.price,
            billing_on: input.billing_on,
            trial_ends_on: input.trial_ends_on,
            plan_expires_on: input.plan_expires_on,
            status: input.status,
            created_at: Utc::now(),
        };
        current.insert(record.shop.clone(), record.id);
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn set_status(&self, id: Uuid, status: BillingStatus) -> AppResult<()> {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.status = status;
        }
        Ok(())
    }

    async fn apply_update(&self, id: Uuid, update: &SubscriptionUpdate) -> AppResult<()> {
        if let Some(record) = self.records.lock().unwrap().get_mut(&id) {
            record.status = update.status;
            if update.subscription_id.is_some() {
                record.subscription_id = update.subscription_id.clone();
            }
            if update.plan_expires_on.is_some() {
                record.plan_expires_on = update.plan_expires_on;
            }
        }
        Ok(())
    }

    async fn cancel_by_charge_id(&self, shop: &str, charge_id: &str) -> AppResult<u64> {
        let mut touched = 0;
        for record in self.records.lock().unwrap().values_mut() {
            if record.shop == shop
                && record.charge_id.as_deref() == Some(charge_id)
                && !record.status.is_terminal()
            {
                record.status = BillingStatus::Cancelled;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn history_for_shop(&self, shop: &str) -> AppResult<Vec<BillingRecord>> {
        let mut history: Vec<BillingRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.shop == shop)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(history)
    }
}

/// Record repo where every call fails, for exercising fail-closed paths.
#[derive(Default)]
pub struct FailingBillingRecordRepo;

#[async_trait]
impl BillingRecordRepo for FailingBillingRecordRepo {
    async fn current_for_shop(&self, _shop: &str) -> AppResult<Option<BillingRecord>> {
        Err(AppError::Storage("record store unavailable".into()))
    }

    async fn insert_as_current(&self, _input: &NewBillingRecord) -> AppResult<BillingRecord> {
        Err(AppError::Storage("record store unavailable".into()))
    }

    async fn set_status(&self, _id: Uuid, _status: BillingStatus) -> AppResult<()> {
        Err(AppError::Storage("record store unavailable".into()))
    }

    async fn apply_update(&self, _id: Uuid, _update: &SubscriptionUpdate) -> AppResult<()> {
        Err(AppError::Storage("record store unavailable".into()))
    }

    async fn cancel_by_charge_id(&self, _shop: &str, _charge_id: &str) -> AppResult<u64> {
        Err(AppError::Storage("record store unavailable".into()))
    }

    async fn history_for_shop(&self, _shop: &str) -> AppResult<Vec<BillingRecord>> {
        Err(AppError::Storage("record store unavailable".into()))
    }
}

// ============================================================================
// InMemoryAnnouncementRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryAnnouncementRepo {
    pub announcements: Mutex<HashMap<Uuid, Announcement>>,
}

impl InMemoryAnnouncementRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, announcement: Announcement) {
        self.announcements
            .lock()
            .unwrap()
            .insert(announcement.id, announcement);
    }

    /// Current counter value, for asserting that a capped view did not write.
    pub fn views_of(&self, id: Uuid) -> i64 {
        self.announcements
            .lock()
            .unwrap()
            .get(&id)
            .map(|a| a.views)
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnnouncementRepo for InMemoryAnnouncementRepo {
    async fn get(&self, id: Uuid) -> AppResult<Option<Announcement>> {
        Ok(self.announcements.lock().unwrap().get(&id).cloned())
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<i64> {
        let mut announcements = self.announcements.lock().unwrap();
        let announcement = announcements.get_mut(&id).ok_or(AppError::NotFound)?;
        announcement.views += 1;
        Ok(announcement.views)
    }

    async fn sum_views_by_shop(&self, shop: &str) -> AppResult<i64> {
        Ok(self
            .announcements
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.shop == shop)
            .map(|a| a.views)
            .sum())
    }
}

// ============================================================================
// InMemorySessionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySessionRepo {
    pub tokens: Mutex<HashMap<String, String>>,
}

impl InMemorySessionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(shop: &str, token: &str) -> Self {
        let repo = Self::default();
        repo.tokens
            .lock()
            .unwrap()
            .insert(shop.to_string(), token.to_string());
        repo
    }
}

#[async_trait]
impl SessionRepo for InMemorySessionRepo {
    async fn find_access_token(&self, shop: &str) -> AppResult<Option<String>> {
        Ok(self.tokens.lock().unwrap().get(shop).cloned())
    }
}

// ============================================================================
// MockBillingApi
// ============================================================================

/// Scriptable billing API: configure what the provider should answer and
/// inspect which activations were attempted.
#[derive(Default)]
pub struct MockBillingApi {
    pub charge: Mutex<Option<ChargeDetails>>,
    pub subscriptions: Mutex<Vec<ActiveSubscription>>,
    pub cancel_outcome: Mutex<Option<CancelOutcome>>,
    pub fail_subscriptions: Mutex<bool>,
    pub activations: Mutex<Vec<String>>,
}

impl MockBillingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_charge(&self, charge: ChargeDetails) {
        *self.charge.lock().unwrap() = Some(charge);
    }

    pub fn set_subscriptions(&self, subscriptions: Vec<ActiveSubscription>) {
        *self.subscriptions.lock().unwrap() = subscriptions;
    }

    pub fn set_cancel_outcome(&self, outcome: CancelOutcome) {
        *self.cancel_outcome.lock().unwrap() = Some(outcome);
    }

    pub fn fail_subscriptions_query(&self) {
        *self.fail_subscriptions.lock().unwrap() = true;
    }

    pub fn activated_charges(&self) -> Vec<String> {
        self.activations.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingApiPort for MockBillingApi {
    async fn create_charge(
        &self,
        shop: &str,
        _access_token: &str,
        _plan: &PlanConfig,
        _return_url: &str,
    ) -> AppResult<CreatedCharge> {
        Ok(CreatedCharge {
            confirmation_url: format!("https://{shop}/admin/charges/confirm/1"),
        })
    }

    async fn get_charge(
        &self,
        _shop: &str,
        _access_token: &str,
        _charge_id: &str,
    ) -> AppResult<ChargeDetails> {
        self.charge
            .lock()
            .unwrap()
            .clone()
            .ok_or(AppError::NotFound)
    }

    async fn activate_charge(
        &self,
        _shop: &str,
        _access_token: &str,
        charge_id: &str,
    ) -> AppResult<()> {
        self.activations.lock().unwrap().push(charge_id.to_string());
        Ok(())
    }

    async fn query_active_subscriptions(
        &self,
        _shop: &str,
        _access_token: &str,
    ) -> AppResult<Vec<ActiveSubscription>> {
        if *self.fail_subscriptions.lock().unwrap() {
            return Err(AppError::upstream("provider unavailable"));
        }
        Ok(self.subscriptions.lock().unwrap().clone())
    }

    async fn cancel_subscription(
        &self,
        _shop: &str,
        _access_token: &str,
        _subscription_id: &str,
    ) -> AppResult<CancelOutcome> {
        Ok(self
            .cancel_outcome
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(CancelOutcome {
                status: Some("CANCELLED".to_string()),
                user_errors: vec![],
            }))
    }
}
