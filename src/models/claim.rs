use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Terminal status of one claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Claimed,
    Failed,
    Skipped,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Claimed => "claimed",
            ClaimStatus::Failed => "failed",
            ClaimStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for the `claim_log` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClaimLogEntry {
    pub id: i64,
    pub condition_id: String,
    pub market_slug: Option<String>,
    pub outcome: Option<String>,
    pub value: Decimal,
    pub status: String,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewClaimLogEntry {
    pub condition_id: String,
    pub market_slug: Option<String>,
    pub outcome: Option<String>,
    pub value: Decimal,
    pub status: ClaimStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl NewClaimLogEntry {
    pub fn for_position(
        position: &ClaimablePosition,
        status: ClaimStatus,
        tx_hash: Option<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            condition_id: position.condition_id.clone(),
            market_slug: position.slug.clone(),
            outcome: position.outcome.clone(),
            value: position.current_value,
            status,
            tx_hash,
            error,
        }
    }
}

/// A position reported by the positions feed, eligible for redemption.
///
/// Never persisted; derived fresh from upstream on every claim cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimablePosition {
    pub condition_id: String,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    pub size: Decimal,
    pub avg_price: Decimal,
    pub cur_price: Decimal,
    pub current_value: Decimal,
    pub realized_pnl: Decimal,
    pub negative_risk: bool,
    pub redeemable: bool,
}

impl ClaimablePosition {
    /// Redeemable and worth something. A zero value is a resolved loss.
    pub fn is_claimable(&self) -> bool {
        self.redeemable && self.current_value > Decimal::ZERO
    }
}
