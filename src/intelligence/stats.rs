use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::polymarket::{ApiActivity, ApiClosedPosition, ApiLeaderboardEntry, ApiPosition, ApiProfile};

/// Everything fetched about one wallet; the classifier's only input.
#[derive(Debug, Clone, Default)]
pub struct TraderData {
    pub wallet: String,
    pub profile: Option<ApiProfile>,
    pub leaderboard: Option<ApiLeaderboardEntry>,
    pub activity: Vec<ApiActivity>,
    pub open_positions: Vec<ApiPosition>,
    pub closed_positions: Vec<ApiClosedPosition>,
}

/// Derived behavioural metrics for a wallet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraderMetrics {
    pub total_volume: Decimal,
    pub trade_count: usize,
    pub markets_traded: usize,
    pub avg_trade_size: Decimal,
    pub largest_trade: Decimal,
    pub trades_per_day: f64,
    pub avg_seconds_between_trades: Option<f64>,
    /// Share of trades under $10, 0..1.
    pub small_trade_ratio: f64,
    /// Share of trades priced below 0.01 or above 0.99, 0..1.
    pub extreme_price_ratio: f64,
    /// Trades over $1000 priced below 0.1 or above 0.9.
    pub large_extreme_trades: usize,
    /// Percentage 0..100; `None` without closed positions.
    pub win_rate: Option<f64>,
    pub closed_positions: usize,
    pub account_age_days: Option<i64>,
    pub unrealized_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub total_pnl: Decimal,
    pub leaderboard_rank: Option<i64>,
    pub verified: bool,
    /// Bio, X handle or avatar present on the public profile.
    pub has_identity: bool,
}

const SECS_PER_DAY: f64 = 86_400.0;
/// Minimum trades before inter-trade gaps are meaningful.
pub const MIN_TRADES_FOR_GAP: usize = 10;

pub fn derive_metrics(data: &TraderData, now: DateTime<Utc>) -> TraderMetrics {
    let trades: Vec<&ApiActivity> = data.activity.iter().filter(|a| a.is_trade()).collect();
    let trade_count = trades.len();

    let total_volume: Decimal = trades.iter().map(|t| t.usdc_size).sum();
    let largest_trade = trades
        .iter()
        .map(|t| t.usdc_size)
        .max()
        .unwrap_or(Decimal::ZERO);

    let markets_traded = trades
        .iter()
        .filter_map(|t| t.title.as_deref())
        .collect::<HashSet<_>>()
        .len();

    let avg_trade_size = if trade_count > 0 {
        total_volume / Decimal::from(trade_count as u64)
    } else {
        Decimal::ZERO
    };

    let mut timestamps: Vec<i64> = trades.iter().map(|t| t.timestamp).collect();
    timestamps.sort_unstable();

    let trades_per_day = trades_per_day(&timestamps);
    let avg_seconds_between_trades = if trade_count >= MIN_TRADES_FOR_GAP {
        let gaps: Vec<i64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        Some(gaps.iter().sum::<i64>() as f64 / gaps.len() as f64)
    } else {
        None
    };

    let small_trade_ratio = ratio(
        trades.iter().filter(|t| t.usdc_size < Decimal::from(10)).count(),
        trade_count,
    );
    let extreme_price_ratio = ratio(
        trades
            .iter()
            .filter(|t| t.price < Decimal::new(1, 2) || t.price > Decimal::new(99, 2))
            .count(),
        trade_count,
    );
    let large_extreme_trades = trades
        .iter()
        .filter(|t| {
            t.usdc_size > Decimal::from(1_000)
                && (t.price < Decimal::new(1, 1) || t.price > Decimal::new(9, 1))
        })
        .count();

    let closed_positions = data.closed_positions.len();
    let win_rate = if closed_positions > 0 {
        let wins = data
            .closed_positions
            .iter()
            .filter(|p| p.realized_pnl > Decimal::ZERO)
            .count();
        Some(wins as f64 / closed_positions as f64 * 100.0)
    } else {
        None
    };

    let account_age_days = data
        .profile
        .as_ref()
        .and_then(|p| p.created_at)
        .map(|created| (now - created).num_days());

    let unrealized_pnl: Decimal = data.open_positions.iter().map(|p| p.cash_pnl).sum();
    let realized_pnl: Decimal = data.closed_positions.iter().map(|p| p.realized_pnl).sum();

    let leaderboard_rank = data
        .leaderboard
        .as_ref()
        .map(|e| e.rank)
        .filter(|r| *r > 0);

    let verified = data.profile.as_ref().is_some_and(|p| p.verified_badge)
        || data.leaderboard.as_ref().is_some_and(|e| e.verified_badge);

    let has_identity = data.profile.as_ref().is_some_and(|p| {
        p.bio.is_some() || p.x_username.is_some() || p.profile_image.is_some()
    });

    TraderMetrics {
        total_volume,
        trade_count,
        markets_traded,
        avg_trade_size,
        largest_trade,
        trades_per_day,
        avg_seconds_between_trades,
        small_trade_ratio,
        extreme_price_ratio,
        large_extreme_trades,
        win_rate,
        closed_positions,
        account_age_days,
        unrealized_pnl,
        realized_pnl,
        total_pnl: unrealized_pnl + realized_pnl,
        leaderboard_rank,
        verified,
        has_identity,
    }
}

/// Trade count over the first-to-last span in days. Zero below two trades;
/// a zero-length span counts as one day.
fn trades_per_day(sorted_timestamps: &[i64]) -> f64 {
    let (Some(first), Some(last)) = (sorted_timestamps.first(), sorted_timestamps.last()) else {
        return 0.0;
    };
    if sorted_timestamps.len() < 2 {
        return 0.0;
    }

    let span_days = (last - first) as f64 / SECS_PER_DAY;
    let days = if span_days > 0.0 { span_days } else { 1.0 };
    sorted_timestamps.len() as f64 / days
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Share of volume taken by the single largest trade, 0..1.
pub fn largest_trade_share(metrics: &TraderMetrics) -> f64 {
    if metrics.total_volume <= Decimal::ZERO {
        return 0.0;
    }
    (metrics.largest_trade / metrics.total_volume)
        .to_f64()
        .unwrap_or(0.0)
}
