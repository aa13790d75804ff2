use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: HeaderValue,
    /// Public origin of this app, used to build charge return URLs.
    pub app_origin: Url,
    pub shopify_api_key: String,
    /// Shared secret for webhook HMAC verification and API auth.
    pub shopify_api_secret: SecretString,
    pub shopify_api_version: String,
    /// When true, charges are created as test charges and never bill.
    pub billing_test_mode: bool,
    pub upstream_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let app_origin: Url = get_env("APP_ORIGIN");
        let shopify_api_key: String = get_env("SHOPIFY_API_KEY");
        let shopify_api_secret: SecretString =
            SecretString::new(get_env::<String>("SHOPIFY_API_SECRET").into());
        let shopify_api_version: String =
            get_env_default("SHOPIFY_API_VERSION", "2025-07".to_string());
        let billing_test_mode: bool = get_env_default("BILLING_TEST_MODE", false);
        let upstream_timeout_secs: u64 = get_env_default("UPSTREAM_TIMEOUT_SECS", 10);

        Self {
            bind_addr,
            database_url,
            cors_origin,
            app_origin,
            shopify_api_key,
            shopify_api_secret,
            shopify_api_version,
            billing_test_mode,
            upstream_timeout_secs,
        }
    }
}
