use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stats::{derive_metrics, largest_trade_share, TraderData, TraderMetrics};
use crate::models::TradeClassification;
use crate::polymarket::{ApiError, MarketDataGateway};

/// Activity entries fetched per wallet.
pub const ACTIVITY_LIMIT: u32 = 500;
/// Closed positions fetched per wallet.
pub const CLOSED_POSITIONS_LIMIT: u32 = 100;

/// Minimum dominant score before a wallet gets a non-normal type.
pub const TYPE_THRESHOLD: i32 = 40;
pub const FOLLOW_WORTHY_THRESHOLD: i32 = 50;

/// Primary trader type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraderType {
    Insider,
    Bot,
    Whale,
    Normal,
}

impl TraderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraderType::Insider => "insider",
            TraderType::Bot => "bot",
            TraderType::Whale => "whale",
            TraderType::Normal => "normal",
        }
    }
}

impl fmt::Display for TraderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason strings behind each score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreReasons {
    pub insider: Vec<String>,
    pub bot: Vec<String>,
    pub whale: Vec<String>,
    pub follow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraderClassification {
    pub wallet: String,
    pub trader_type: TraderType,
    pub confidence: i32,
    pub insider_score: i32,
    pub bot_score: i32,
    pub whale_score: i32,
    pub follow_score: i32,
    pub follow_worthy: bool,
    pub display_name: Option<String>,
    pub reasons: ScoreReasons,
    pub metrics: TraderMetrics,
}

impl TraderClassification {
    /// Fields persisted onto each of the wallet's trades.
    pub fn trade_fields(&self) -> TradeClassification {
        TradeClassification {
            good_trader: self.follow_worthy,
            insider_score: self.insider_score,
            bot_score: self.bot_score,
            whale_score: self.whale_score,
            follow_score: self.follow_score,
            classification: self.trader_type.as_str().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Fetch + classify
// ---------------------------------------------------------------------------

/// Fetch everything known about `wallet` and score it.
///
/// Profile, leaderboard and position lookups degrade to empty on failure;
/// an activity fetch failure is returned to the caller.
pub async fn classify_trader(
    gateway: &dyn MarketDataGateway,
    wallet: &str,
) -> Result<TraderClassification, ApiError> {
    let (profile, leaderboard, activity, open_positions, closed_positions) = tokio::join!(
        gateway.fetch_profile(wallet),
        gateway.fetch_leaderboard_rank(wallet),
        gateway.fetch_activity(wallet, ACTIVITY_LIMIT),
        gateway.fetch_positions(wallet, false),
        gateway.fetch_closed_positions(wallet, CLOSED_POSITIONS_LIMIT),
    );

    let activity = activity?;

    let data = TraderData {
        wallet: wallet.to_string(),
        profile: degrade(wallet, "profile", profile).flatten(),
        leaderboard: degrade(wallet, "leaderboard", leaderboard).flatten(),
        activity,
        open_positions: degrade(wallet, "positions", open_positions).unwrap_or_default(),
        closed_positions: degrade(wallet, "closed positions", closed_positions)
            .unwrap_or_default(),
    };

    Ok(classify(&data, Utc::now()))
}

fn degrade<T>(wallet: &str, what: &str, result: Result<T, ApiError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(wallet = %wallet, error = %e, "{what} fetch failed, scoring without it");
            None
        }
    }
}

/// Score already-fetched data. Deterministic for a given `now`.
pub fn classify(data: &TraderData, now: DateTime<Utc>) -> TraderClassification {
    let metrics = derive_metrics(data, now);

    let (insider_score, insider) = insider_score(&metrics);
    let (bot_score, bot) = bot_score(&metrics);
    let (whale_score, whale) = whale_score(&metrics);
    let (follow_score, follow) = follow_score(&metrics, bot_score);

    let (trader_type, top) = primary_type(insider_score, bot_score, whale_score);

    let display_name = data
        .profile
        .as_ref()
        .and_then(|p| p.name.clone().or_else(|| p.pseudonym.clone()))
        .or_else(|| data.leaderboard.as_ref().and_then(|e| e.user_name.clone()));

    TraderClassification {
        wallet: data.wallet.clone(),
        trader_type,
        confidence: top.min(100),
        insider_score,
        bot_score,
        whale_score,
        follow_score,
        follow_worthy: follow_score >= FOLLOW_WORTHY_THRESHOLD,
        display_name,
        reasons: ScoreReasons {
            insider,
            bot,
            whale,
            follow,
        },
        metrics,
    }
}

/// Highest of the three type scores; ties go insider, then bot, then whale.
fn primary_type(insider: i32, bot: i32, whale: i32) -> (TraderType, i32) {
    let mut best = (TraderType::Insider, insider);
    if bot > best.1 {
        best = (TraderType::Bot, bot);
    }
    if whale > best.1 {
        best = (TraderType::Whale, whale);
    }

    if best.1 >= TYPE_THRESHOLD {
        best
    } else {
        (TraderType::Normal, best.1)
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

fn usd(value: Decimal) -> String {
    format!("${}", value.round())
}

fn insider_score(m: &TraderMetrics) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if let Some(age) = m.account_age_days {
        if age < 7 {
            score += 30;
            reasons.push(format!("New account ({age} days old)"));
        } else if age < 30 {
            score += 15;
            reasons.push(format!("Young account ({age} days old)"));
        }
    }

    if m.trade_count > 0 {
        if m.markets_traded < 3 {
            score += 25;
            reasons.push(format!("Concentrated in {} market(s)", m.markets_traded));
        } else if m.markets_traded < 5 {
            score += 15;
            reasons.push(format!("Trades only {} markets", m.markets_traded));
        }
    }

    let share = largest_trade_share(m);
    if share > 0.5 {
        score += 20;
        reasons.push(format!(
            "Single trade is {:.0}% of volume",
            share * 100.0
        ));
    }

    if m.large_extreme_trades > 0 {
        score += 15;
        reasons.push(format!(
            "{} large trade(s) at extreme odds",
            m.large_extreme_trades
        ));
    }

    if !m.has_identity {
        score += 10;
        reasons.push("No bio, handle or avatar".to_string());
    }

    if let Some(win_rate) = m.win_rate {
        if win_rate > 80.0 && (3..20).contains(&m.closed_positions) {
            score += 15;
            reasons.push(format!(
                "{win_rate:.0}% win rate over {} closed positions",
                m.closed_positions
            ));
        }
    }

    if m.verified {
        score -= 20;
        reasons.push("Verified account".to_string());
    }
    if m.markets_traded > 20 {
        score -= 15;
        reasons.push(format!("Diversified across {} markets", m.markets_traded));
    }

    (score.max(0), reasons)
}

fn bot_score(m: &TraderMetrics) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if m.trades_per_day > 50.0 {
        score += 35;
        reasons.push(format!("{:.1} trades per day", m.trades_per_day));
    } else if m.trades_per_day > 20.0 {
        score += 20;
        reasons.push(format!("{:.1} trades per day", m.trades_per_day));
    }

    if let Some(gap) = m.avg_seconds_between_trades {
        if gap < 60.0 {
            score += 25;
            reasons.push(format!("Average {gap:.0}s between trades"));
        } else if gap < 300.0 {
            score += 10;
            reasons.push(format!("Average {gap:.0}s between trades"));
        }
    }

    if m.small_trade_ratio > 0.8 && m.trade_count > 20 {
        score += 20;
        reasons.push(format!(
            "{:.0}% of trades under $10",
            m.small_trade_ratio * 100.0
        ));
    }

    if m.extreme_price_ratio > 0.3 && m.trade_count > 10 {
        score += 15;
        reasons.push(format!(
            "{:.0}% of trades at extreme prices",
            m.extreme_price_ratio * 100.0
        ));
    }

    (score, reasons)
}

fn whale_score(m: &TraderMetrics) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    if m.total_volume > Decimal::from(1_000_000) {
        score += 40;
        reasons.push(format!("{} total volume", usd(m.total_volume)));
    } else if m.total_volume > Decimal::from(500_000) {
        score += 25;
        reasons.push(format!("{} total volume", usd(m.total_volume)));
    }

    if m.avg_trade_size > Decimal::from(25_000) {
        score += 35;
        reasons.push(format!("{} average trade", usd(m.avg_trade_size)));
    } else if m.avg_trade_size > Decimal::from(10_000) {
        score += 20;
        reasons.push(format!("{} average trade", usd(m.avg_trade_size)));
    }

    if let Some(rank) = m.leaderboard_rank {
        if rank <= 100 {
            score += 25;
            reasons.push(format!("Leaderboard rank #{rank}"));
        } else if rank <= 500 {
            score += 15;
            reasons.push(format!("Leaderboard rank #{rank}"));
        }
    }

    if m.verified {
        score += 10;
        reasons.push("Verified account".to_string());
    }

    (score, reasons)
}

fn follow_score(m: &TraderMetrics, bot_score: i32) -> (i32, Vec<String>) {
    let mut score = 0;
    let mut reasons = Vec::new();

    let pnl = m.total_pnl;
    if pnl > Decimal::from(100_000) {
        score += 30;
        reasons.push(format!("Exceptional PnL {}", usd(pnl)));
    } else if pnl > Decimal::from(10_000) {
        score += 20;
        reasons.push(format!("Strong PnL {}", usd(pnl)));
    } else if pnl > Decimal::ZERO {
        score += 10;
        reasons.push(format!("Profitable {}", usd(pnl)));
    } else if pnl < Decimal::from(-10_000) {
        score -= 20;
        reasons.push(format!("Heavy losses {}", usd(pnl)));
    } else if pnl < Decimal::ZERO {
        score -= 10;
        reasons.push(format!("Losing {}", usd(pnl)));
    }

    if let Some(win_rate) = m.win_rate.filter(|_| m.closed_positions >= 5) {
        if win_rate >= 70.0 {
            score += 25;
            reasons.push(format!("High win rate {win_rate:.0}%"));
        } else if win_rate >= 60.0 {
            score += 15;
            reasons.push(format!("Good win rate {win_rate:.0}%"));
        } else if win_rate >= 50.0 {
            score += 10;
            reasons.push(format!("Positive win rate {win_rate:.0}%"));
        } else if win_rate < 40.0 {
            score -= 15;
            reasons.push(format!("Low win rate {win_rate:.0}%"));
        }
    }

    if m.closed_positions >= 50 {
        score += 15;
        reasons.push(format!("{} closed positions", m.closed_positions));
    } else if m.closed_positions >= 20 {
        score += 10;
        reasons.push(format!("{} closed positions", m.closed_positions));
    } else if m.closed_positions < 3 {
        score -= 10;
        reasons.push("Limited track record".to_string());
    }

    if m.markets_traded >= 20 {
        score += 10;
        reasons.push(format!("Active in {} markets", m.markets_traded));
    } else if m.markets_traded >= 10 {
        score += 5;
        reasons.push(format!("Active in {} markets", m.markets_traded));
    }

    if let Some(age) = m.account_age_days {
        if age >= 365 {
            score += 10;
            reasons.push(format!("Established account ({age} days)"));
        } else if age >= 90 {
            score += 5;
            reasons.push(format!("Account age {age} days"));
        } else if age < 14 {
            score -= 10;
            reasons.push(format!("Very new account ({age} days)"));
        }
    }

    if let Some(rank) = m.leaderboard_rank {
        if rank <= 100 {
            score += 15;
            reasons.push(format!("Top 100 leaderboard (#{rank})"));
        } else if rank <= 500 {
            score += 10;
            reasons.push(format!("Top 500 leaderboard (#{rank})"));
        } else if rank <= 1000 {
            score += 5;
            reasons.push(format!("Top 1000 leaderboard (#{rank})"));
        }
    }

    if bot_score >= 50 {
        score -= 20;
        reasons.push("Likely automated".to_string());
    } else if bot_score >= 30 {
        score -= 10;
        reasons.push("Some automated patterns".to_string());
    }

    if m.trade_count > 0 {
        let avg = m.avg_trade_size;
        if avg >= Decimal::from(500) && avg <= Decimal::from(50_000) {
            score += 5;
            reasons.push(format!("Meaningful average size {}", usd(avg)));
        } else if avg < Decimal::from(50) {
            score -= 5;
            reasons.push(format!("Tiny average size {}", usd(avg)));
        }
    }

    (score.clamp(0, 100), reasons)
}
