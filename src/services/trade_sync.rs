use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;

use super::classification::{ClassificationService, ClassifyReport};
use crate::db::TradeStore;
use crate::models::{NewTrade, Side};
use crate::polymarket::{ApiTrade, MarketDataGateway};

pub const TRADE_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeSyncReport {
    pub fetched: usize,
    pub below_minimum: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub classification: ClassifyReport,
}

/// Map a feed trade to a storable one. Trades without a hash or with an
/// unknown side are dropped.
pub fn to_new_trade(t: &ApiTrade) -> Option<NewTrade> {
    let hash = t.transaction_hash.clone()?;
    let side = Side::from_api_str(&t.side)?;

    Some(NewTrade {
        transaction_hash: hash,
        proxy_wallet: t.proxy_wallet.clone(),
        condition_id: t.condition_id.clone(),
        asset: t.asset.clone(),
        title: t.title.clone(),
        slug: t.slug.clone(),
        outcome: t.outcome.clone(),
        side,
        size: t.size,
        price: t.price,
        timestamp: t.timestamp,
    })
}

/// Ingest the latest trades above `min_usd` and classify the wallets behind
/// the newly stored ones. A feed error aborts the cycle.
pub async fn sync_trades(
    gateway: &dyn MarketDataGateway,
    trades: &dyn TradeStore,
    classifier: &ClassificationService,
    pages: u32,
    min_usd: Decimal,
) -> anyhow::Result<TradeSyncReport> {
    let mut report = TradeSyncReport::default();
    let mut new_wallets: Vec<String> = Vec::new();
    let mut seen_wallets: HashSet<String> = HashSet::new();

    for page in 0..pages {
        let batch = gateway
            .fetch_trades(TRADE_PAGE_SIZE, page * TRADE_PAGE_SIZE)
            .await?;
        report.fetched += batch.len();

        for api_trade in &batch {
            let Some(trade) = to_new_trade(api_trade) else {
                continue;
            };
            if trade.usd_value() < min_usd {
                report.below_minimum += 1;
                continue;
            }

            match trades.insert_trade_if_new(&trade).await {
                Ok(true) => {
                    report.inserted += 1;
                    if seen_wallets.insert(trade.proxy_wallet.clone()) {
                        new_wallets.push(trade.proxy_wallet.clone());
                    }
                }
                Ok(false) => report.duplicates += 1,
                Err(e) => {
                    tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to store trade");
                }
            }
        }

        if batch.len() < TRADE_PAGE_SIZE as usize {
            break;
        }
    }

    metrics::counter!("trades_ingested_total").increment(report.inserted as u64);

    if !new_wallets.is_empty() {
        report.classification = classifier.classify_and_apply(&new_wallets).await;
    }

    tracing::info!(
        fetched = report.fetched,
        inserted = report.inserted,
        duplicates = report.duplicates,
        wallets = new_wallets.len(),
        take_bets = report.classification.take_bets,
        "Trade sync complete"
    );

    Ok(report)
}

pub async fn run_trade_sync(
    gateway: Arc<dyn MarketDataGateway>,
    trades: Arc<dyn TradeStore>,
    classifier: Arc<ClassificationService>,
    period: std::time::Duration,
    pages: u32,
    min_usd: Decimal,
) {
    super::run_periodic("trade_sync", period, move || {
        let gateway = gateway.clone();
        let trades = trades.clone();
        let classifier = classifier.clone();
        async move {
            sync_trades(gateway.as_ref(), trades.as_ref(), &classifier, pages, min_usd).await?;
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
    fn trade_without_hash_is_dropped() {
        let mut t = fixtures::api_trade("0xabc", "0xw", &fixtures::condition_id(1), "BUY", dec!(10), dec!(0.5), 1);
        assert_eq!(to_new_trade(&t).map(|n| n.usd_value()), Some(dec!(5.0)));

        t.transaction_hash = None;
        assert!(to_new_trade(&t).is_none());
    }

    #[test]
    fn trade_with_unknown_side_is_dropped() {
        let t = fixtures::api_trade("0xabc", "0xw", &fixtures::condition_id(1), "HOLD", dec!(10), dec!(0.5), 1);
        assert!(to_new_trade(&t).is_none());
    }
}
