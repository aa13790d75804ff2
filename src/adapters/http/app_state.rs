use std::sync::Arc;

use crate::{
    application::use_cases::{
        subscription_lifecycle::SubscriptionLifecycle, view_metering::ViewMetering,
    },
    infra::{config::AppConfig, webhook_verifier::WebhookVerifier},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub lifecycle: Arc<SubscriptionLifecycle>,
    pub metering: Arc<ViewMetering>,
    pub webhook_verifier: Arc<WebhookVerifier>,
}
