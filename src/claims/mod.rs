pub mod calls;
pub mod engine;
pub mod executor;
pub mod rate_limit;
pub mod session;

pub use calls::{RedeemCall, MAX_BATCH_SIZE};
pub use engine::{
    BatchClaimResult, ClaimEngine, ClaimRunSummary, InvalidPosition, PollSettings,
    PositionOutcome, PreValidation, RunStatus,
};
pub use executor::{ExecutorError, RelayerExecutor, TransactionExecutor};
pub use rate_limit::{classify_relayer_error, RateLimitState, RateLimitStatus, RelayerFailure};
pub use session::{ClaimCredentials, ClaimSession};

use thiserror::Error;

use crate::polymarket::ApiError;

/// Claim-side failures. Per-position variants display the upstream text
/// verbatim.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("claiming is not configured")]
    NotConfigured,

    #[error("invalid claim credentials: {0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    RateLimited(String),

    #[error("{0}")]
    PreValidationFailed(String),

    #[error("{0}")]
    OracleNotReady(String),

    #[error("{0}")]
    TransactionFailed(String),

    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailed(#[from] ApiError),

    #[error("claim log unavailable: {0}")]
    Store(anyhow::Error),
}

impl ClaimError {
    /// Map relayer/transaction failure text onto its claim error kind.
    pub fn from_relayer_text(message: String) -> Self {
        match classify_relayer_error(&message) {
            RelayerFailure::RateLimited => ClaimError::RateLimited(message),
            RelayerFailure::OracleNotReady => ClaimError::OracleNotReady(message),
            RelayerFailure::Other => ClaimError::TransactionFailed(message),
        }
    }
}
