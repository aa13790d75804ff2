use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::use_cases::{
        subscription_lifecycle::{BillingRecordRepo, SessionRepo, SubscriptionLifecycle},
        view_metering::{AnnouncementRepo, ViewMetering},
    },
    infra::{
        config::AppConfig, db::init_db, shopify_client::ShopifyBillingClient,
        webhook_verifier::WebhookVerifier,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let record_repo_arc = postgres_arc.clone() as Arc<dyn BillingRecordRepo>;
    let session_repo_arc = postgres_arc.clone() as Arc<dyn SessionRepo>;
    let announcement_repo_arc = postgres_arc.clone() as Arc<dyn AnnouncementRepo>;

    let billing_api = Arc::new(ShopifyBillingClient::new(
        config.shopify_api_version.clone(),
        config.billing_test_mode,
        config.upstream_timeout_secs,
    ));

    let lifecycle = SubscriptionLifecycle::new(
        record_repo_arc.clone(),
        session_repo_arc,
        billing_api,
        config.app_origin.to_string(),
    );

    let metering = ViewMetering::new(announcement_repo_arc, record_repo_arc);

    let webhook_verifier = WebhookVerifier::new(config.shopify_api_secret.clone());

    Ok(AppState {
        config: Arc::new(config),
        lifecycle: Arc::new(lifecycle),
        metering: Arc::new(metering),
        webhook_verifier: Arc::new(webhook_verifier),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "announcebar_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
