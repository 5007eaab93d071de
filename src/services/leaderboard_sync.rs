use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::db::{LedgerKey, TopTraderStore};
use crate::models::{Side, TopPvTrader, TopTraderTradeDelta};
use crate::polymarket::{ApiLeaderboardEntry, ApiTrade, MarketDataGateway};

pub const TOP_TRADER_COUNT: u32 = 50;
pub const TRADES_PER_TRADER: u32 = 500;
const WALLET_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaderboardReport {
    pub traders: usize,
    pub new_trades: usize,
    pub ledger_rows: usize,
    pub failed_wallets: usize,
}

pub fn to_top_trader(entry: &ApiLeaderboardEntry) -> TopPvTrader {
    TopPvTrader {
        proxy_wallet: entry.proxy_wallet.clone(),
        rank: i32::try_from(entry.rank).unwrap_or(i32::MAX),
        user_name: entry.user_name.clone(),
        x_username: entry.x_username.clone(),
        verified: entry.verified_badge,
        pnl: entry.pnl,
        volume: entry.vol,
        synced_at: None,
    }
}

/// Fold a wallet's trades into ledger deltas, keeping only trades strictly
/// newer than the last timestamp already stored for their key.
pub fn aggregate_new_trades(
    wallet: &str,
    trades: &[ApiTrade],
    last_seen: &HashMap<LedgerKey, i64>,
) -> Vec<TopTraderTradeDelta> {
    let mut deltas: BTreeMap<LedgerKey, TopTraderTradeDelta> = BTreeMap::new();

    for t in trades {
        let Some(side) = Side::from_api_str(&t.side) else {
            continue;
        };
        let slug = t
            .slug
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| t.condition_id.clone());
        let key: LedgerKey = (slug.clone(), side.as_str().to_string(), t.outcome.clone());

        if last_seen.get(&key).is_some_and(|&last| t.timestamp <= last) {
            continue;
        }

        let value = t.size * t.price;
        deltas
            .entry(key)
            .and_modify(|d| {
                d.size += t.size;
                d.value += value;
                d.trade_count += 1;
                d.first_timestamp = d.first_timestamp.min(t.timestamp);
                d.last_timestamp = d.last_timestamp.max(t.timestamp);
            })
            .or_insert_with(|| TopTraderTradeDelta {
                proxy_wallet: wallet.to_string(),
                slug,
                title: t.title.clone(),
                condition_id: Some(t.condition_id.clone()),
                side: side.as_str().to_string(),
                outcome: t.outcome.clone(),
                size: t.size,
                value,
                trade_count: 1,
                first_timestamp: t.timestamp,
                last_timestamp: t.timestamp,
            });
    }

    deltas.into_values().collect()
}

/// Refresh the top-trader snapshot and extend each trader's ledger with
/// trades not yet accumulated. Running it twice adds nothing the second time.
pub async fn sync_leaderboard(
    gateway: &dyn MarketDataGateway,
    store: &dyn TopTraderStore,
    batch_delay: Duration,
) -> anyhow::Result<LeaderboardReport> {
    let entries = gateway.fetch_leaderboard(TOP_TRADER_COUNT).await?;
    let traders: Vec<TopPvTrader> = entries.iter().map(to_top_trader).collect();
    store.replace_top_traders(&traders).await?;

    let mut report = LeaderboardReport {
        traders: traders.len(),
        ..Default::default()
    };

    for (i, batch) in traders.chunks(WALLET_BATCH_SIZE).enumerate() {
        if i > 0 && !batch_delay.is_zero() {
            tokio::time::sleep(batch_delay).await;
        }

        let fetched = join_all(
            batch
                .iter()
                .map(|t| gateway.fetch_wallet_trades(&t.proxy_wallet, TRADES_PER_TRADER)),
        )
        .await;

        for (trader, result) in batch.iter().zip(fetched) {
            let wallet = &trader.proxy_wallet;
            let trades = match result {
                Ok(t) => t,
                Err(e) => {
                    report.failed_wallets += 1;
                    tracing::warn!(wallet = %wallet, error = %e, "Failed to fetch top trader trades");
                    continue;
                }
            };

            let last_seen = store.ledger_last_timestamps(wallet).await?;
            for delta in aggregate_new_trades(wallet, &trades, &last_seen) {
                match store.accumulate_trades(&delta).await {
                    Ok(()) => {
                        report.ledger_rows += 1;
                        report.new_trades += delta.trade_count as usize;
                    }
                    Err(e) => {
                        tracing::warn!(wallet = %wallet, slug = %delta.slug, error = %e, "Failed to accumulate ledger row");
                    }
                }
            }
        }
    }

    tracing::info!(
        traders = report.traders,
        new_trades = report.new_trades,
        ledger_rows = report.ledger_rows,
        failed_wallets = report.failed_wallets,
        "Leaderboard sync complete"
    );

    Ok(report)
}

pub async fn run_leaderboard_sync(
    gateway: Arc<dyn MarketDataGateway>,
    store: Arc<dyn TopTraderStore>,
    period: Duration,
) {
    super::run_periodic("leaderboard_sync", period, move || {
        let gateway = gateway.clone();
        let store = store.clone();
        async move {
            sync_leaderboard(gateway.as_ref(), store.as_ref(), Duration::from_secs(1)).await?;
            Ok(())
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::fixtures;
    use rust_decimal_macros::dec;

    #[test]
    fn trades_fold_by_slug_side_outcome() {
        let c = fixtures::condition_id(1);
        let trades = vec![
            fixtures::api_trade("0x1", "0xw", &c, "BUY", dec!(100), dec!(0.4), 10),
            fixtures::api_trade("0x2", "0xw", &c, "BUY", dec!(100), dec!(0.6), 20),
            fixtures::api_trade("0x3", "0xw", &c, "SELL", dec!(50), dec!(0.7), 30),
        ];

        let deltas = aggregate_new_trades("0xw", &trades, &HashMap::new());
        assert_eq!(deltas.len(), 2);

        let buy = deltas.iter().find(|d| d.side == "BUY").unwrap();
        assert_eq!(buy.size, dec!(200));
        assert_eq!(buy.value, dec!(100.0));
        assert_eq!(buy.trade_count, 2);
        assert_eq!((buy.first_timestamp, buy.last_timestamp), (10, 20));
    }

    #[test]
    fn trades_at_or_before_last_seen_are_skipped() {
        let c = fixtures::condition_id(1);
        let trades = vec![
            fixtures::api_trade("0x1", "0xw", &c, "BUY", dec!(100), dec!(0.4), 10),
            fixtures::api_trade("0x2", "0xw", &c, "BUY", dec!(100), dec!(0.6), 20),
            fixtures::api_trade("0x3", "0xw", &c, "BUY", dec!(10), dec!(0.5), 30),
        ];
        let slug = format!("market-{c}");
        let last_seen = HashMap::from([((slug, "BUY".to_string(), "Yes".to_string()), 20)]);

        let deltas = aggregate_new_trades("0xw", &trades, &last_seen);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].trade_count, 1);
        assert_eq!(deltas[0].last_timestamp, 30);
    }

    #[test]
    fn missing_slug_falls_back_to_condition_id() {
        let c = fixtures::condition_id(2);
        let mut t = fixtures::api_trade("0x1", "0xw", &c, "BUY", dec!(1), dec!(0.5), 1);
        t.slug = None;

        let deltas = aggregate_new_trades("0xw", &[t], &HashMap::new());
        assert_eq!(deltas[0].slug, c);
    }
}
