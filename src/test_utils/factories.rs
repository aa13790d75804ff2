//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible
//! defaults. Use the closure parameter to override specific fields as needed.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    announcement::{Announcement, AnnouncementStatus},
    billing_record::{BillingRecord, BillingStatus},
};

/// Create a test billing record with sensible defaults: an active paid
/// subscription one week into its 30-day period.
pub fn create_test_record(overrides: impl FnOnce(&mut BillingRecord)) -> BillingRecord {
    let now = Utc::now();
    let billing_on = now - Duration::days(7);
    let mut record = BillingRecord {
        id: Uuid::new_v4(),
        shop: "test-shop.myshopify.com".to_string(),
        charge_id: Some("10001".to_string()),
        subscription_id: Some("gid://shopify/AppSubscription/1".to_string()),
        plan_name: Some("Premium".to_string()),
        price: Some(499.0),
        billing_on: Some(billing_on),
        trial_ends_on: Some(billing_on + Duration::days(1)),
        plan_expires_on: Some(billing_on + Duration::days(31)),
        status: BillingStatus::Active,
        created_at: billing_on,
    };
    overrides(&mut record);
    record
}

/// Create a test announcement banner with sensible defaults.
pub fn create_test_announcement(overrides: impl FnOnce(&mut Announcement)) -> Announcement {
    let mut announcement = Announcement {
        id: Uuid::new_v4(),
        shop: "test-shop.myshopify.com".to_string(),
        name: "Summer sale".to_string(),
        status: AnnouncementStatus::Active,
        views: 0,
        view_limit: None,
        settings: serde_json::json!({}),
        created_at: Utc::now(),
    };
    overrides(&mut announcement);
    announcement
}
