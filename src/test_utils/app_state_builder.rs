//! Test app state builder for HTTP-level integration testing.
//!
//! Creates a minimal `AppState` backed by in-memory mocks so routes can be
//! exercised with `axum_test::TestServer`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        subscription_lifecycle::{BillingRecordRepo, SubscriptionLifecycle},
        view_metering::ViewMetering,
    },
    domain::entities::{announcement::Announcement, billing_record::BillingRecord},
    infra::{config::AppConfig, webhook_verifier::WebhookVerifier},
    test_utils::{
        FailingBillingRecordRepo, InMemoryAnnouncementRepo, InMemoryBillingRecordRepo,
        InMemorySessionRepo, MockBillingApi,
    },
};

/// Shared secret the builder wires into the webhook verifier; tests sign
/// payloads with it.
pub const TEST_WEBHOOK_SECRET: &str = "shpss_test_webhook_secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        database_url: String::new(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        shopify_api_key: "test_api_key".to_string(),
        shopify_api_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        shopify_api_version: "2025-07".to_string(),
        billing_test_mode: true,
        upstream_timeout_secs: 10,
    }
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let record = create_test_record(|r| r.status = BillingStatus::Active);
/// let app_state = TestAppStateBuilder::new()
///     .with_session("test-shop.myshopify.com")
///     .with_record(record)
///     .build();
/// ```
pub struct TestAppStateBuilder {
    record_repo: Option<Arc<InMemoryBillingRecordRepo>>,
    records: Vec<BillingRecord>,
    announcements: Vec<Announcement>,
    sessions: Vec<String>,
    cancel_user_errors: Option<Vec<String>>,
    failing_record_repo: bool,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            record_repo: None,
            records: vec![],
            announcements: vec![],
            sessions: vec![],
            cancel_user_errors: None,
            failing_record_repo: false,
        }
    }

    /// Seed a billing record (and make it the shop's current one).
    pub fn with_record(mut self, record: BillingRecord) -> Self {
        self.records.push(record);
        self
    }

    /// Use a caller-owned record repo, for asserting on state after requests.
    pub fn with_record_repo(mut self, repo: Arc<InMemoryBillingRecordRepo>) -> Self {
        self.record_repo = Some(repo);
        self
    }

    pub fn with_announcement(mut self, announcement: Announcement) -> Self {
        self.announcements.push(announcement);
        self
    }

    /// Give the shop a stored offline access token.
    pub fn with_session(mut self, shop: &str) -> Self {
        self.sessions.push(shop.to_string());
        self
    }

    /// Make the provider reject cancellations with these user errors.
    pub fn with_cancel_user_errors(mut self, user_errors: Vec<String>) -> Self {
        self.cancel_user_errors = Some(user_errors);
        self
    }

    /// Swap the record store for one where every call fails.
    pub fn with_failing_record_repo(mut self) -> Self {
        self.failing_record_repo = true;
        self
    }

    pub fn build(self) -> AppState {
        let config = Arc::new(test_config());

        let record_repo: Arc<dyn BillingRecordRepo> = if self.failing_record_repo {
            Arc::new(FailingBillingRecordRepo)
        } else {
            let repo = self
                .record_repo
                .unwrap_or_else(|| Arc::new(InMemoryBillingRecordRepo::new()));
            for record in self.records {
                repo.seed(record);
            }
            repo
        };

        let announcement_repo = Arc::new(InMemoryAnnouncementRepo::new());
        for announcement in self.announcements {
            announcement_repo.seed(announcement);
        }

        let session_repo = Arc::new(InMemorySessionRepo::new());
        for shop in self.sessions {
            session_repo
                .tokens
                .lock()
                .unwrap()
                .insert(shop, "shpat_test_token".to_string());
        }

        let billing_api = Arc::new(MockBillingApi::new());
        if let Some(user_errors) = self.cancel_user_errors {
            billing_api.set_cancel_outcome(
                crate::application::ports::billing_api::CancelOutcome {
                    status: None,
                    user_errors,
                },
            );
        }

        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            record_repo.clone(),
            session_repo,
            billing_api,
            config.app_origin.to_string(),
        ));

        let metering = Arc::new(ViewMetering::new(announcement_repo, record_repo));

        let webhook_verifier = Arc::new(WebhookVerifier::new(SecretString::new(
            TEST_WEBHOOK_SECRET.into(),
        )));

        AppState {
            config,
            lifecycle,
            metering,
            webhook_verifier,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
