use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::ClaimablePosition;
use crate::polymarket::{
    ApiActivity, ApiClosedPosition, ApiLeaderboardEntry, ApiPosition, ApiProfile, ApiTrade,
    MarketStatus,
};

/// A well-formed 32-byte condition id derived from `n`.
pub fn condition_id(n: u32) -> String {
    format!("0x{n:064x}")
}

pub fn api_trade(
    hash: &str,
    wallet: &str,
    condition: &str,
    side: &str,
    size: Decimal,
    price: Decimal,
    timestamp: i64,
) -> ApiTrade {
    ApiTrade {
        proxy_wallet: wallet.to_string(),
        side: side.to_string(),
        asset: "1001".to_string(),
        condition_id: condition.to_string(),
        size,
        price,
        timestamp,
        title: Some(format!("Market {condition}")),
        slug: Some(format!("market-{condition}")),
        outcome: "Yes".to_string(),
        transaction_hash: Some(hash.to_string()),
    }
}

pub fn api_position(condition: &str, value: Decimal, redeemable: bool) -> ApiPosition {
    ApiPosition {
        proxy_wallet: None,
        asset: None,
        condition_id: condition.to_string(),
        size: value,
        avg_price: Decimal::new(5, 1),
        initial_value: value / Decimal::from(2),
        current_value: value,
        cash_pnl: Decimal::ZERO,
        realized_pnl: Decimal::ZERO,
        cur_price: if value > Decimal::ZERO { Decimal::ONE } else { Decimal::ZERO },
        redeemable,
        title: Some(format!("Market {condition}")),
        slug: Some(format!("market-{condition}")),
        outcome: Some("Yes".to_string()),
        negative_risk: false,
    }
}

pub fn claimable(condition: &str, value: Decimal) -> ClaimablePosition {
    ClaimablePosition {
        condition_id: condition.to_string(),
        slug: Some(format!("market-{condition}")),
        title: None,
        outcome: Some("Yes".to_string()),
        size: value,
        avg_price: Decimal::new(5, 1),
        cur_price: Decimal::ONE,
        current_value: value,
        realized_pnl: Decimal::ZERO,
        negative_risk: false,
        redeemable: true,
    }
}

pub fn activity_trade(timestamp: i64, usd: Decimal, price: Decimal, title: &str) -> ApiActivity {
    ApiActivity {
        activity_type: "TRADE".to_string(),
        timestamp,
        condition_id: None,
        size: if price > Decimal::ZERO { usd / price } else { Decimal::ZERO },
        usdc_size: usd,
        price,
        side: Some("BUY".to_string()),
        title: Some(title.to_string()),
        outcome: Some("Yes".to_string()),
    }
}

pub fn closed_position(realized_pnl: Decimal) -> ApiClosedPosition {
    ApiClosedPosition {
        condition_id: None,
        title: None,
        outcome: None,
        avg_price: Decimal::new(5, 1),
        total_bought: Decimal::from(100),
        realized_pnl,
        timestamp: 0,
    }
}

pub fn leaderboard_entry(rank: i64, wallet: &str, pnl: Decimal) -> ApiLeaderboardEntry {
    ApiLeaderboardEntry {
        rank,
        proxy_wallet: wallet.to_string(),
        user_name: Some(format!("trader{rank}")),
        vol: pnl * Decimal::from(10),
        pnl,
        x_username: None,
        verified_badge: false,
    }
}

pub fn profile(created_at: DateTime<Utc>, name: &str) -> ApiProfile {
    ApiProfile {
        created_at: Some(created_at),
        name: Some(name.to_string()),
        bio: Some("trader".to_string()),
        ..Default::default()
    }
}

pub fn resolved_market(winner: &str) -> MarketStatus {
    MarketStatus {
        resolved: true,
        winning_outcome: Some(winner.to_string()),
        end_date: None,
    }
}

pub fn open_market(end_date: Option<DateTime<Utc>>) -> MarketStatus {
    MarketStatus {
        resolved: false,
        winning_outcome: None,
        end_date,
    }
}
