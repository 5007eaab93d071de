//! Storage seams used by the claim engine and sync jobs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::top_trader_repo::LedgerKey;
use super::{bet_repo, claim_repo, top_trader_repo, trade_repo};
use crate::models::{
    BetLogEntry, ClaimLogEntry, NewBet, NewClaimLogEntry, NewTrade, ResolutionUpdate,
    TopPvTrader, TopTraderTrade, TopTraderTradeDelta, Trade, TradeClassification,
};

#[async_trait]
pub trait TradeStore: Send + Sync {
    /// True when the hash was not yet stored.
    async fn insert_trade_if_new(&self, trade: &NewTrade) -> anyhow::Result<bool>;

    async fn get_trade(&self, transaction_hash: &str) -> anyhow::Result<Option<Trade>>;

    async fn list_trades(
        &self,
        wallet: Option<&str>,
        take_bets_only: bool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Trade>>;

    async fn trades_due_for_resolution(
        &self,
        stale_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Trade>>;

    async fn set_resolution(
        &self,
        transaction_hash: &str,
        update: &ResolutionUpdate,
        checked_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn mark_resolution_checked(
        &self,
        transaction_hash: &str,
        checked_at: DateTime<Utc>,
        market_end_date: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;

    async fn apply_classification(
        &self,
        wallet: &str,
        classification: &TradeClassification,
    ) -> anyhow::Result<u64>;

    async fn undecided_take_bets(&self, wallet: &str) -> anyhow::Result<Vec<Trade>>;

    async fn has_take_bet(&self, wallet: &str, condition_id: &str, outcome: &str) -> anyhow::Result<bool>;

    async fn set_take_bet(&self, transaction_hash: &str, take_bet: bool) -> anyhow::Result<()>;

    async fn unclassified_wallets(&self, trade_limit: i64) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
pub trait ClaimLog: Send + Sync {
    async fn record_claim(&self, entry: &NewClaimLogEntry) -> anyhow::Result<()>;

    async fn claimed_condition_ids(&self, condition_ids: &[String]) -> anyhow::Result<HashSet<String>>;

    async fn recent_claims(&self, limit: i64) -> anyhow::Result<Vec<ClaimLogEntry>>;
}

#[async_trait]
pub trait TopTraderStore: Send + Sync {
    async fn replace_top_traders(&self, traders: &[TopPvTrader]) -> anyhow::Result<()>;

    async fn top_traders(&self) -> anyhow::Result<Vec<TopPvTrader>>;

    async fn ledger_last_timestamps(&self, wallet: &str) -> anyhow::Result<HashMap<LedgerKey, i64>>;

    async fn accumulate_trades(&self, delta: &TopTraderTradeDelta) -> anyhow::Result<()>;

    async fn trader_ledger(&self, wallet: &str) -> anyhow::Result<Vec<TopTraderTrade>>;
}

#[async_trait]
pub trait BetLog: Send + Sync {
    async fn uncopied_take_bets(&self, limit: i64) -> anyhow::Result<Vec<Trade>>;

    /// `None` when the trade already has a bet-log row.
    async fn record_bet(&self, bet: &NewBet) -> anyhow::Result<Option<BetLogEntry>>;
}

/// Postgres-backed store delegating to the repository functions.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TradeStore for PgStore {
    async fn insert_trade_if_new(&self, trade: &NewTrade) -> anyhow::Result<bool> {
        trade_repo::insert_if_new(&self.pool, trade).await
    }

    async fn get_trade(&self, transaction_hash: &str) -> anyhow::Result<Option<Trade>> {
        trade_repo::get_trade(&self.pool, transaction_hash).await
    }

    async fn list_trades(
        &self,
        wallet: Option<&str>,
        take_bets_only: bool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Trade>> {
        trade_repo::list_trades(&self.pool, wallet, take_bets_only, limit, offset).await
    }

    async fn trades_due_for_resolution(
        &self,
        stale_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Trade>> {
        trade_repo::get_due_for_resolution(&self.pool, stale_before, limit).await
    }

    async fn set_resolution(
        &self,
        transaction_hash: &str,
        update: &ResolutionUpdate,
        checked_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        trade_repo::set_resolution(&self.pool, transaction_hash, update, checked_at).await
    }

    async fn mark_resolution_checked(
        &self,
        transaction_hash: &str,
        checked_at: DateTime<Utc>,
        market_end_date: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        trade_repo::mark_checked(&self.pool, transaction_hash, checked_at, market_end_date).await
    }

    async fn apply_classification(
        &self,
        wallet: &str,
        classification: &TradeClassification,
    ) -> anyhow::Result<u64> {
        trade_repo::apply_classification(&self.pool, wallet, classification).await
    }

    async fn undecided_take_bets(&self, wallet: &str) -> anyhow::Result<Vec<Trade>> {
        trade_repo::get_undecided_take_bets(&self.pool, wallet).await
    }

    async fn has_take_bet(&self, wallet: &str, condition_id: &str, outcome: &str) -> anyhow::Result<bool> {
        trade_repo::has_take_bet(&self.pool, wallet, condition_id, outcome).await
    }

    async fn set_take_bet(&self, transaction_hash: &str, take_bet: bool) -> anyhow::Result<()> {
        trade_repo::set_take_bet(&self.pool, transaction_hash, take_bet).await
    }

    async fn unclassified_wallets(&self, trade_limit: i64) -> anyhow::Result<Vec<String>> {
        trade_repo::get_unclassified_wallets(&self.pool, trade_limit).await
    }
}

#[async_trait]
impl ClaimLog for PgStore {
    async fn record_claim(&self, entry: &NewClaimLogEntry) -> anyhow::Result<()> {
        claim_repo::insert_entry(&self.pool, entry).await.map(|_| ())
    }

    async fn claimed_condition_ids(&self, condition_ids: &[String]) -> anyhow::Result<HashSet<String>> {
        claim_repo::get_claimed_condition_ids(&self.pool, condition_ids).await
    }

    async fn recent_claims(&self, limit: i64) -> anyhow::Result<Vec<ClaimLogEntry>> {
        claim_repo::get_recent(&self.pool, limit).await
    }
}

#[async_trait]
impl TopTraderStore for PgStore {
    async fn replace_top_traders(&self, traders: &[TopPvTrader]) -> anyhow::Result<()> {
        top_trader_repo::replace_top_traders(&self.pool, traders).await
    }

    async fn top_traders(&self) -> anyhow::Result<Vec<TopPvTrader>> {
        top_trader_repo::get_top_traders(&self.pool).await
    }

    async fn ledger_last_timestamps(&self, wallet: &str) -> anyhow::Result<HashMap<LedgerKey, i64>> {
        top_trader_repo::get_last_timestamps(&self.pool, wallet).await
    }

    async fn accumulate_trades(&self, delta: &TopTraderTradeDelta) -> anyhow::Result<()> {
        top_trader_repo::accumulate(&self.pool, delta).await
    }

    async fn trader_ledger(&self, wallet: &str) -> anyhow::Result<Vec<TopTraderTrade>> {
        top_trader_repo::get_trader_trades(&self.pool, wallet).await
    }
}

#[async_trait]
impl BetLog for PgStore {
    async fn uncopied_take_bets(&self, limit: i64) -> anyhow::Result<Vec<Trade>> {
        bet_repo::get_uncopied_take_bets(&self.pool, limit).await
    }

    async fn record_bet(&self, bet: &NewBet) -> anyhow::Result<Option<BetLogEntry>> {
        bet_repo::insert_bet(&self.pool, bet).await
    }
}
