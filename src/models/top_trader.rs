use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database row for the `top_pv_traders` leaderboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TopPvTrader {
    pub proxy_wallet: String,
    pub rank: i32,
    pub user_name: Option<String>,
    pub x_username: Option<String>,
    pub verified: bool,
    pub pnl: Decimal,
    pub volume: Decimal,
    pub synced_at: Option<DateTime<Utc>>,
}

/// Database row for the `top_trader_trades` aggregated ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TopTraderTrade {
    pub id: i64,
    pub proxy_wallet: String,
    pub slug: String,
    pub title: Option<String>,
    pub condition_id: Option<String>,
    pub side: String,
    pub outcome: String,
    pub total_size: Decimal,
    pub total_value: Decimal,
    pub avg_price: Decimal,
    pub trade_count: i32,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    pub updated_at: DateTime<Utc>,
}

/// Trades for one (wallet, slug, side, outcome) key, aggregated from a
/// single fetch and merged into the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct TopTraderTradeDelta {
    pub proxy_wallet: String,
    pub slug: String,
    pub title: Option<String>,
    pub condition_id: Option<String>,
    pub side: String,
    pub outcome: String,
    pub size: Decimal,
    pub value: Decimal,
    pub trade_count: i32,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}
