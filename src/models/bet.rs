use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Placed,
    DryRun,
    Failed,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Placed => "placed",
            BetStatus::DryRun => "dry_run",
            BetStatus::Failed => "failed",
        }
    }
}

/// Database row for the `bet_log` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BetLogEntry {
    pub id: Uuid,
    pub transaction_hash: String,
    pub condition_id: String,
    pub outcome: String,
    pub price: Decimal,
    pub size: Decimal,
    pub status: String,
    pub order_id: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBet {
    pub transaction_hash: String,
    pub condition_id: String,
    pub outcome: String,
    pub price: Decimal,
    pub size: Decimal,
    pub status: BetStatus,
    pub order_id: Option<String>,
    pub error: Option<String>,
}
