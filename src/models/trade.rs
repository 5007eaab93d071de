use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{ResolvedStatus, Side};

/// Database row for the `trades` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trade {
    pub transaction_hash: String,
    pub proxy_wallet: String,
    pub condition_id: String,
    pub asset: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub outcome: String,
    pub side: String,
    pub size: Decimal,
    pub price: Decimal,
    pub usd_value: Decimal,
    pub timestamp: i64,
    pub market_end_date: Option<DateTime<Utc>>,
    pub resolved_status: Option<String>,
    pub profit_per_dollar: Option<Decimal>,
    pub good_trader: Option<bool>,
    pub insider_score: Option<i32>,
    pub bot_score: Option<i32>,
    pub whale_score: Option<i32>,
    pub follow_score: Option<i32>,
    pub classification: Option<String>,
    pub take_bet: Option<bool>,
    pub last_resolution_check: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Trade {
    pub fn side(&self) -> Option<Side> {
        Side::from_api_str(&self.side)
    }

    pub fn resolved(&self) -> Option<ResolvedStatus> {
        self.resolved_status.as_deref().and_then(ResolvedStatus::parse)
    }
}

/// A trade as ingested from the trade feed, before any enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub transaction_hash: String,
    pub proxy_wallet: String,
    pub condition_id: String,
    pub asset: String,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub outcome: String,
    pub side: Side,
    pub size: Decimal,
    pub price: Decimal,
    pub timestamp: i64,
}

impl NewTrade {
    /// USD notional: size × price.
    pub fn usd_value(&self) -> Decimal {
        self.size * self.price
    }
}

/// Fields written by the resolution sync.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionUpdate {
    pub resolved_status: ResolvedStatus,
    pub profit_per_dollar: Option<Decimal>,
    pub market_end_date: Option<DateTime<Utc>>,
}

/// Fields written by the classifier onto every trade of a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeClassification {
    pub good_trader: bool,
    pub insider_score: i32,
    pub bot_score: i32,
    pub whale_score: i32,
    pub follow_score: i32,
    pub classification: String,
}

/// Return per dollar staked for a settled trade.
///
/// Only BUY trades carry a value: `(1 - p) / p` when won, `-1` when lost.
/// A non-positive entry price has no defined return.
pub fn profit_per_dollar(side: Side, price: Decimal, status: ResolvedStatus) -> Option<Decimal> {
    if side != Side::Buy {
        return None;
    }

    match status {
        ResolvedStatus::Won if price > Decimal::ZERO => Some((Decimal::ONE - price) / price),
        ResolvedStatus::Won => None,
        ResolvedStatus::Lost => Some(-Decimal::ONE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_that_wins_at_quarter_returns_three() {
        let ppd = profit_per_dollar(Side::Buy, Decimal::new(25, 2), ResolvedStatus::Won);
        assert_eq!(ppd, Some(Decimal::from(3)));
    }

    #[test]
    fn buy_that_loses_returns_minus_one() {
        let ppd = profit_per_dollar(Side::Buy, Decimal::new(25, 2), ResolvedStatus::Lost);
        assert_eq!(ppd, Some(Decimal::NEGATIVE_ONE));
    }

    #[test]
    fn sell_has_no_profit_per_dollar() {
        assert_eq!(
            profit_per_dollar(Side::Sell, Decimal::new(25, 2), ResolvedStatus::Won),
            None
        );
        assert_eq!(
            profit_per_dollar(Side::Sell, Decimal::new(25, 2), ResolvedStatus::Lost),
            None
        );
    }

    #[test]
    fn zero_price_win_is_undefined() {
        assert_eq!(
            profit_per_dollar(Side::Buy, Decimal::ZERO, ResolvedStatus::Won),
            None
        );
    }
}
