//! In-memory store with the same semantics as the Postgres schema,
//! including the unique keys.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{BetLog, ClaimLog, TopTraderStore, TradeStore};
use super::top_trader_repo::LedgerKey;
use crate::models::{
    BetLogEntry, ClaimLogEntry, ClaimStatus, NewBet, NewClaimLogEntry, NewTrade,
    ResolutionUpdate, TopPvTrader, TopTraderTrade, TopTraderTradeDelta, Trade,
    TradeClassification,
};

#[derive(Default)]
struct Tables {
    trades: HashMap<String, Trade>,
    claim_log: Vec<ClaimLogEntry>,
    top_traders: Vec<TopPvTrader>,
    ledger: Vec<TopTraderTrade>,
    bets: Vec<BetLogEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_take_bet_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All trades, oldest first.
    pub async fn trades(&self) -> Vec<Trade> {
        let mut trades: Vec<Trade> = self.tables.lock().await.trades.values().cloned().collect();
        trades.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.transaction_hash.cmp(&b.transaction_hash)));
        trades
    }

    pub async fn claims(&self) -> Vec<ClaimLogEntry> {
        self.tables.lock().await.claim_log.clone()
    }

    pub async fn bets(&self) -> Vec<BetLogEntry> {
        self.tables.lock().await.bets.clone()
    }

    pub async fn ledger(&self) -> Vec<TopTraderTrade> {
        self.tables.lock().await.ledger.clone()
    }

    /// Make the next `count` take-bet lookups fail.
    pub fn fail_take_bet_lookups(&self, count: usize) {
        self.failing_take_bet_lookups.store(count, Ordering::SeqCst);
    }

    /// Overwrite a stored trade, e.g. to seed enrichment state.
    pub async fn put_trade(&self, trade: Trade) {
        self.tables
            .lock()
            .await
            .trades
            .insert(trade.transaction_hash.clone(), trade);
    }
}

fn trade_row(t: &NewTrade) -> Trade {
    Trade {
        transaction_hash: t.transaction_hash.clone(),
        proxy_wallet: t.proxy_wallet.clone(),
        condition_id: t.condition_id.clone(),
        asset: t.asset.clone(),
        title: t.title.clone(),
        slug: t.slug.clone(),
        outcome: t.outcome.clone(),
        side: t.side.as_str().to_string(),
        size: t.size,
        price: t.price,
        usd_value: t.usd_value(),
        timestamp: t.timestamp,
        market_end_date: None,
        resolved_status: None,
        profit_per_dollar: None,
        good_trader: None,
        insider_score: None,
        bot_score: None,
        whale_score: None,
        follow_score: None,
        classification: None,
        take_bet: None,
        last_resolution_check: None,
        created_at: Some(Utc::now()),
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn insert_trade_if_new(&self, trade: &NewTrade) -> anyhow::Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.trades.contains_key(&trade.transaction_hash) {
            return Ok(false);
        }
        tables
            .trades
            .insert(trade.transaction_hash.clone(), trade_row(trade));
        Ok(true)
    }

    async fn get_trade(&self, transaction_hash: &str) -> anyhow::Result<Option<Trade>> {
        Ok(self.tables.lock().await.trades.get(transaction_hash).cloned())
    }

    async fn list_trades(
        &self,
        wallet: Option<&str>,
        take_bets_only: bool,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Trade>> {
        let mut trades: Vec<Trade> = self
            .trades()
            .await
            .into_iter()
            .filter(|t| wallet.map_or(true, |w| t.proxy_wallet == w))
            .filter(|t| !take_bets_only || t.take_bet == Some(true))
            .collect();
        trades.reverse();

        Ok(trades
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn trades_due_for_resolution(
        &self,
        stale_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Trade>> {
        let mut due: Vec<Trade> = self
            .trades()
            .await
            .into_iter()
            .filter(|t| t.resolved_status.is_none())
            .filter(|t| t.last_resolution_check.map_or(true, |c| c < stale_before))
            .collect();
        due.sort_by_key(|t| (t.last_resolution_check, t.timestamp));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn set_resolution(
        &self,
        transaction_hash: &str,
        update: &ResolutionUpdate,
        checked_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if let Some(t) = self.tables.lock().await.trades.get_mut(transaction_hash) {
            t.resolved_status = Some(update.resolved_status.as_str().to_string());
            t.profit_per_dollar = update.profit_per_dollar;
            t.market_end_date = update.market_end_date.or(t.market_end_date);
            t.last_resolution_check = Some(checked_at);
        }
        Ok(())
    }

    async fn mark_resolution_checked(
        &self,
        transaction_hash: &str,
        checked_at: DateTime<Utc>,
        market_end_date: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        if let Some(t) = self.tables.lock().await.trades.get_mut(transaction_hash) {
            t.last_resolution_check = Some(checked_at);
            t.market_end_date = t.market_end_date.or(market_end_date);
        }
        Ok(())
    }

    async fn apply_classification(
        &self,
        wallet: &str,
        c: &TradeClassification,
    ) -> anyhow::Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut updated = 0;
        for t in tables.trades.values_mut().filter(|t| t.proxy_wallet == wallet) {
            t.good_trader = Some(c.good_trader);
            t.insider_score = Some(c.insider_score);
            t.bot_score = Some(c.bot_score);
            t.whale_score = Some(c.whale_score);
            t.follow_score = Some(c.follow_score);
            t.classification = Some(c.classification.clone());
            updated += 1;
        }
        Ok(updated)
    }

    async fn undecided_take_bets(&self, wallet: &str) -> anyhow::Result<Vec<Trade>> {
        Ok(self
            .trades()
            .await
            .into_iter()
            .filter(|t| t.proxy_wallet == wallet && t.take_bet.is_none())
            .collect())
    }

    async fn has_take_bet(&self, wallet: &str, condition_id: &str, outcome: &str) -> anyhow::Result<bool> {
        let failing = self
            .failing_take_bet_lookups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            anyhow::bail!("connection reset while checking take bets");
        }

        Ok(self.tables.lock().await.trades.values().any(|t| {
            t.proxy_wallet == wallet
                && t.condition_id == condition_id
                && t.outcome == outcome
                && t.take_bet == Some(true)
        }))
    }

    async fn set_take_bet(&self, transaction_hash: &str, take_bet: bool) -> anyhow::Result<()> {
        if let Some(t) = self.tables.lock().await.trades.get_mut(transaction_hash) {
            t.take_bet = Some(take_bet);
        }
        Ok(())
    }

    async fn unclassified_wallets(&self, trade_limit: i64) -> anyhow::Result<Vec<String>> {
        let mut wallets = Vec::new();
        for t in self
            .trades()
            .await
            .into_iter()
            .filter(|t| t.classification.is_none())
            .take(trade_limit.max(0) as usize)
        {
            if !wallets.contains(&t.proxy_wallet) {
                wallets.push(t.proxy_wallet);
            }
        }
        Ok(wallets)
    }
}

#[async_trait]
impl ClaimLog for MemoryStore {
    async fn record_claim(&self, entry: &NewClaimLogEntry) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        let claimed = entry.status == ClaimStatus::Claimed;

        if claimed
            && tables
                .claim_log
                .iter()
                .any(|e| e.condition_id == entry.condition_id && e.status == "claimed")
        {
            anyhow::bail!("condition {} already logged as claimed", entry.condition_id);
        }

        let now = Utc::now();
        let id = tables.claim_log.len() as i64 + 1;
        tables.claim_log.push(ClaimLogEntry {
            id,
            condition_id: entry.condition_id.clone(),
            market_slug: entry.market_slug.clone(),
            outcome: entry.outcome.clone(),
            value: entry.value,
            status: entry.status.as_str().to_string(),
            tx_hash: entry.tx_hash.clone(),
            error: entry.error.clone(),
            created_at: now,
            claimed_at: claimed.then_some(now),
        });
        Ok(())
    }

    async fn claimed_condition_ids(&self, condition_ids: &[String]) -> anyhow::Result<HashSet<String>> {
        Ok(self
            .tables
            .lock()
            .await
            .claim_log
            .iter()
            .filter(|e| e.status == "claimed" && condition_ids.contains(&e.condition_id))
            .map(|e| e.condition_id.clone())
            .collect())
    }

    async fn recent_claims(&self, limit: i64) -> anyhow::Result<Vec<ClaimLogEntry>> {
        Ok(self
            .tables
            .lock()
            .await
            .claim_log
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TopTraderStore for MemoryStore {
    async fn replace_top_traders(&self, traders: &[TopPvTrader]) -> anyhow::Result<()> {
        let now = Utc::now();
        self.tables.lock().await.top_traders = traders
            .iter()
            .cloned()
            .map(|t| TopPvTrader {
                synced_at: Some(now),
                ..t
            })
            .collect();
        Ok(())
    }

    async fn top_traders(&self) -> anyhow::Result<Vec<TopPvTrader>> {
        let mut traders = self.tables.lock().await.top_traders.clone();
        traders.sort_by_key(|t| t.rank);
        Ok(traders)
    }

    async fn ledger_last_timestamps(&self, wallet: &str) -> anyhow::Result<HashMap<LedgerKey, i64>> {
        Ok(self
            .tables
            .lock()
            .await
            .ledger
            .iter()
            .filter(|r| r.proxy_wallet == wallet)
            .map(|r| ((r.slug.clone(), r.side.clone(), r.outcome.clone()), r.last_timestamp))
            .collect())
    }

    async fn accumulate_trades(&self, d: &TopTraderTradeDelta) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let existing = tables.ledger.iter_mut().find(|r| {
            r.proxy_wallet == d.proxy_wallet && r.slug == d.slug && r.side == d.side && r.outcome == d.outcome
        });

        match existing {
            Some(row) => {
                row.total_size += d.size;
                row.total_value += d.value;
                row.avg_price = if row.total_size > Decimal::ZERO {
                    row.total_value / row.total_size
                } else {
                    Decimal::ZERO
                };
                row.trade_count += d.trade_count;
                row.first_timestamp = row.first_timestamp.min(d.first_timestamp);
                row.last_timestamp = row.last_timestamp.max(d.last_timestamp);
                row.title = d.title.clone().or(row.title.take());
                row.condition_id = d.condition_id.clone().or(row.condition_id.take());
                row.updated_at = now;
            }
            None => {
                let id = tables.ledger.len() as i64 + 1;
                tables.ledger.push(TopTraderTrade {
                    id,
                    proxy_wallet: d.proxy_wallet.clone(),
                    slug: d.slug.clone(),
                    title: d.title.clone(),
                    condition_id: d.condition_id.clone(),
                    side: d.side.clone(),
                    outcome: d.outcome.clone(),
                    total_size: d.size,
                    total_value: d.value,
                    avg_price: if d.size > Decimal::ZERO {
                        d.value / d.size
                    } else {
                        Decimal::ZERO
                    },
                    trade_count: d.trade_count,
                    first_timestamp: d.first_timestamp,
                    last_timestamp: d.last_timestamp,
                    updated_at: now,
                });
            }
        }
        Ok(())
    }

    async fn trader_ledger(&self, wallet: &str) -> anyhow::Result<Vec<TopTraderTrade>> {
        let mut rows: Vec<TopTraderTrade> = self
            .tables
            .lock()
            .await
            .ledger
            .iter()
            .filter(|r| r.proxy_wallet == wallet)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_timestamp.cmp(&a.last_timestamp));
        Ok(rows)
    }
}

#[async_trait]
impl BetLog for MemoryStore {
    async fn uncopied_take_bets(&self, limit: i64) -> anyhow::Result<Vec<Trade>> {
        let copied: HashSet<String> = self
            .tables
            .lock()
            .await
            .bets
            .iter()
            .map(|b| b.transaction_hash.clone())
            .collect();

        Ok(self
            .trades()
            .await
            .into_iter()
            .filter(|t| t.take_bet == Some(true) && !copied.contains(&t.transaction_hash))
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn record_bet(&self, bet: &NewBet) -> anyhow::Result<Option<BetLogEntry>> {
        let mut tables = self.tables.lock().await;
        if tables.bets.iter().any(|b| b.transaction_hash == bet.transaction_hash) {
            return Ok(None);
        }

        let entry = BetLogEntry {
            id: Uuid::new_v4(),
            transaction_hash: bet.transaction_hash.clone(),
            condition_id: bet.condition_id.clone(),
            outcome: bet.outcome.clone(),
            price: bet.price,
            size: bet.size,
            status: bet.status.as_str().to_string(),
            order_id: bet.order_id.clone(),
            error: bet.error.clone(),
            created_at: Utc::now(),
        };
        tables.bets.push(entry.clone());
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;

    fn new_trade(hash: &str) -> NewTrade {
        NewTrade {
            transaction_hash: hash.into(),
            proxy_wallet: "0xw".into(),
            condition_id: "0xc".into(),
            asset: "1".into(),
            title: None,
            slug: None,
            outcome: "Yes".into(),
            side: Side::Buy,
            size: Decimal::from(4_000),
            price: Decimal::new(5, 1),
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn duplicate_hash_is_a_no_op() {
        let store = MemoryStore::new();
        assert!(store.insert_trade_if_new(&new_trade("0xa")).await.unwrap());
        assert!(!store.insert_trade_if_new(&new_trade("0xa")).await.unwrap());
        assert_eq!(store.trades().await.len(), 1);
    }

    #[tokio::test]
    async fn second_claimed_row_rejected() {
        let store = MemoryStore::new();
        let entry = NewClaimLogEntry {
            condition_id: "0xc".into(),
            market_slug: None,
            outcome: None,
            value: Decimal::ONE,
            status: ClaimStatus::Claimed,
            tx_hash: Some("0xtx".into()),
            error: None,
        };
        store.record_claim(&entry).await.unwrap();
        assert!(store.record_claim(&entry).await.is_err());

        let failed = NewClaimLogEntry {
            status: ClaimStatus::Failed,
            ..entry
        };
        store.record_claim(&failed).await.unwrap();
        assert_eq!(store.claims().await.len(), 2);
    }
}
