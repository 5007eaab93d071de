pub mod bet;
pub mod claim;
pub mod top_trader;
pub mod trade;

pub use bet::{BetLogEntry, BetStatus, NewBet};
pub use claim::{ClaimLogEntry, ClaimStatus, ClaimablePosition, NewClaimLogEntry};
pub use top_trader::{TopPvTrader, TopTraderTrade, TopTraderTradeDelta};
pub use trade::{
    profit_per_dollar, NewTrade, ResolutionUpdate, Trade, TradeClassification,
};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" | "0" => Some(Side::Buy),
            "SELL" | "1" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ResolvedStatus
// ---------------------------------------------------------------------------

/// Settlement of a trade's outcome once its market resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedStatus {
    Won,
    Lost,
}

impl ResolvedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedStatus::Won => "won",
            ResolvedStatus::Lost => "lost",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "won" => Some(ResolvedStatus::Won),
            "lost" => Some(ResolvedStatus::Lost),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
