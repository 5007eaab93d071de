use base64::{
    engine::general_purpose::{STANDARD as BASE64, URL_SAFE as BASE64_URL_SAFE},
    Engine,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid base64 secret: {0}")]
    InvalidSecret(#[from] base64::DecodeError),

    #[error("HMAC computation failed: {0}")]
    HmacError(String),
}

/// Builder API credentials used to authenticate relayer submissions.
#[derive(Debug, Clone)]
pub struct BuilderAuth {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl BuilderAuth {
    pub fn new(api_key: String, api_secret: String, passphrase: String) -> Self {
        Self {
            api_key,
            api_secret,
            passphrase,
        }
    }

    /// Build the HMAC-SHA256 signature over `{timestamp}{method}{path}{body}`.
    ///
    /// The secret is base64-decoded before use; the signature is URL-safe base64.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<String, AuthError> {
        // Secrets are issued URL-safe, older ones standard
        let secret_bytes = BASE64_URL_SAFE
            .decode(&self.api_secret)
            .or_else(|_| BASE64.decode(&self.api_secret))?;

        let message = format!("{timestamp}{method}{path}{body}");

        let mut mac = HmacSha256::new_from_slice(&secret_bytes)
            .map_err(|e| AuthError::HmacError(e.to_string()))?;

        mac.update(message.as_bytes());
        let result = mac.finalize();

        Ok(BASE64_URL_SAFE.encode(result.into_bytes()))
    }

    /// `POLY_BUILDER_*` headers for one request.
    pub fn headers(
        &self,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>, AuthError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&timestamp, method, path, body)?;

        Ok(vec![
            ("POLY_BUILDER_API_KEY", self.api_key.clone()),
            ("POLY_BUILDER_PASSPHRASE", self.passphrase.clone()),
            ("POLY_BUILDER_SIGNATURE", signature),
            ("POLY_BUILDER_TIMESTAMP", timestamp),
        ])
    }
}
