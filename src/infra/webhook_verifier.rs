use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::app_error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Verifies webhook deliveries: HMAC-SHA256 over the raw body, keyed with
/// the app's shared secret, compared against the base64 signature header.
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Constant-time check via `Mac::verify_slice`. Any mismatch or
    /// undecodable signature is an auth failure, never a parse error.
    pub fn verify(&self, body: &[u8], signature_b64: &str) -> AppResult<()> {
        let expected = base64::engine::general_purpose::STANDARD
            .decode(signature_b64)
            .map_err(|_| AppError::Auth)?;

        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AppError::Auth)?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| AppError::Auth)
    }
}
