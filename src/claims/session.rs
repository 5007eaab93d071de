use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;

use super::executor::{RelayerExecutor, TransactionExecutor};
use super::rate_limit::{RateLimitState, RateLimitStatus};
use super::ClaimError;
use crate::config::AppConfig;
use crate::polymarket::{BuilderAuth, ChainClient, RelayerClient};

/// Everything needed to build a live executor.
#[derive(Clone)]
pub struct ClaimCredentials {
    pub private_key: String,
    pub funder: Address,
    pub builder: BuilderAuth,
    pub rpc_url: String,
    pub relayer_url: String,
}

impl ClaimCredentials {
    /// `None` unless every credential is present and the funder parses.
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        let funder_raw = config.funder_address.as_deref()?;
        let funder = match Address::from_str(funder_raw) {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(funder = %funder_raw, error = %e, "FUNDER_ADDRESS is not a valid address");
                return None;
            }
        };

        Some(Self {
            private_key: config.private_key.clone()?,
            funder,
            builder: BuilderAuth::new(
                config.builder_api_key.clone()?,
                config.builder_secret.clone()?,
                config.builder_passphrase.clone()?,
            ),
            rpc_url: config.polygon_rpc_url.clone(),
            relayer_url: config.relayer_url.clone(),
        })
    }
}

enum ExecutorSource {
    Unconfigured,
    Credentials(ClaimCredentials),
    Fixed(Arc<dyn TransactionExecutor>),
}

/// Claim-side state for one process: credentials, the lazily built
/// executor and relayer quota state.
///
/// The executor is built on first use and cached until [`ClaimSession::reset`].
pub struct ClaimSession {
    http: Client,
    funder: Option<Address>,
    source: ExecutorSource,
    executor: Mutex<Option<Arc<dyn TransactionExecutor>>>,
    rate_limit: Mutex<RateLimitState>,
}

impl ClaimSession {
    pub fn new(http: Client, credentials: Option<ClaimCredentials>) -> Self {
        let (funder, source) = match credentials {
            Some(c) => (Some(c.funder), ExecutorSource::Credentials(c)),
            None => (None, ExecutorSource::Unconfigured),
        };
        Self {
            http,
            funder,
            source,
            executor: Mutex::new(None),
            rate_limit: Mutex::new(RateLimitState::default()),
        }
    }

    /// Session around a ready-made executor.
    pub fn with_executor(funder: Address, executor: Arc<dyn TransactionExecutor>) -> Self {
        Self {
            http: Client::new(),
            funder: Some(funder),
            source: ExecutorSource::Fixed(executor),
            executor: Mutex::new(None),
            rate_limit: Mutex::new(RateLimitState::default()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.funder.is_some() && !matches!(self.source, ExecutorSource::Unconfigured)
    }

    pub fn funder(&self) -> Option<Address> {
        self.funder
    }

    pub async fn executor(&self) -> Result<Arc<dyn TransactionExecutor>, ClaimError> {
        let mut cached = self.executor.lock().await;
        if let Some(executor) = cached.as_ref() {
            return Ok(Arc::clone(executor));
        }

        let executor: Arc<dyn TransactionExecutor> = match &self.source {
            ExecutorSource::Unconfigured => return Err(ClaimError::NotConfigured),
            ExecutorSource::Fixed(executor) => Arc::clone(executor),
            ExecutorSource::Credentials(creds) => Arc::new(self.build_executor(creds)?),
        };

        *cached = Some(Arc::clone(&executor));
        Ok(executor)
    }

    fn build_executor(&self, creds: &ClaimCredentials) -> Result<RelayerExecutor, ClaimError> {
        let signer = PrivateKeySigner::from_str(&creds.private_key)
            .map_err(|e| ClaimError::InvalidCredentials(format!("private key: {e}")))?;
        let chain = ChainClient::connect(&creds.rpc_url)
            .map_err(|e| ClaimError::InvalidCredentials(e.to_string()))?;
        let relayer = RelayerClient::new(
            self.http.clone(),
            creds.relayer_url.clone(),
            creds.builder.clone(),
            signer,
            creds.funder,
        );

        tracing::info!(funder = %creds.funder, "Claim executor initialised");
        Ok(RelayerExecutor::new(chain, relayer))
    }

    pub async fn is_rate_limited_at(&self, now: DateTime<Utc>) -> bool {
        self.rate_limit.lock().await.is_active_at(now)
    }

    pub async fn record_rate_limit_at(&self, message: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        self.rate_limit.lock().await.record_at(message, now)
    }

    pub async fn rate_limit_status_at(&self, now: DateTime<Utc>) -> RateLimitStatus {
        self.rate_limit.lock().await.status_at(now)
    }

    /// Drop the cached executor and clear quota state.
    pub async fn reset(&self) {
        *self.executor.lock().await = None;
        *self.rate_limit.lock().await = RateLimitState::default();
    }
}
