use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;

use crate::db::TradeStore;
use crate::intelligence::{classify_trader, ClassificationCache, TakeBetRules, TraderClassification};
use crate::polymarket::{ApiError, MarketDataGateway};

/// Wallets classified concurrently per batch.
pub const WALLET_BATCH_SIZE: usize = 5;
pub const WALLET_BATCH_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifyReport {
    pub classified: usize,
    pub failed: usize,
    pub trades_updated: u64,
    pub take_bets: usize,
}

/// Classifies wallets, caches the result and writes it onto their trades,
/// deciding each trade's take-bet flag.
pub struct ClassificationService {
    gateway: Arc<dyn MarketDataGateway>,
    trades: Arc<dyn TradeStore>,
    cache: ClassificationCache,
    rules: TakeBetRules,
    batch_delay: Duration,
}

impl ClassificationService {
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        trades: Arc<dyn TradeStore>,
        rules: TakeBetRules,
    ) -> Self {
        Self {
            gateway,
            trades,
            cache: ClassificationCache::default(),
            rules,
            batch_delay: WALLET_BATCH_DELAY,
        }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    /// Classify `wallet`, reusing a cached result within its TTL.
    pub async fn classify_wallet(&self, wallet: &str) -> Result<TraderClassification, ApiError> {
        let now = Utc::now();
        if let Some(cached) = self.cache.get(wallet, now).await {
            return Ok(cached);
        }

        let classification = classify_trader(self.gateway.as_ref(), wallet).await?;
        metrics::counter!("wallets_classified_total").increment(1);
        self.cache.insert(classification.clone(), now).await;
        Ok(classification)
    }

    /// Classify `wallets` in rate-limited batches and apply the results.
    pub async fn classify_and_apply(&self, wallets: &[String]) -> ClassifyReport {
        let mut report = ClassifyReport::default();

        for (i, batch) in wallets.chunks(WALLET_BATCH_SIZE).enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let results = join_all(batch.iter().map(|w| self.classify_wallet(w))).await;
            for (wallet, result) in batch.iter().zip(results) {
                match result {
                    Ok(c) => {
                        report.classified += 1;
                        let (updated, take_bets) = self.apply(wallet, &c).await;
                        report.trades_updated += updated;
                        report.take_bets += take_bets;
                    }
                    Err(e) => {
                        report.failed += 1;
                        tracing::warn!(wallet = %wallet, error = %e, "Wallet classification failed");
                    }
                }
            }
        }

        metrics::counter!("trades_classified_total").increment(report.trades_updated);
        report
    }

    /// Write classification fields and decide pending take bets.
    /// Returns (trades updated, take bets flagged).
    async fn apply(&self, wallet: &str, c: &TraderClassification) -> (u64, usize) {
        let updated = match self.trades.apply_classification(wallet, &c.trade_fields()).await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(wallet = %wallet, error = %e, "Failed to store classification");
                return (0, 0);
            }
        };

        let pending = match self.trades.undecided_take_bets(wallet).await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(wallet = %wallet, error = %e, "Failed to load trades for take-bet evaluation");
                return (updated, 0);
            }
        };

        let mut flagged = 0;
        for trade in pending {
            let qualifies = trade
                .side()
                .is_some_and(|side| self.rules.qualifies(c, side, trade.price));

            // One take bet per (wallet, condition, outcome); checked right before the write.
            let take_bet = if qualifies {
                match self
                    .trades
                    .has_take_bet(wallet, &trade.condition_id, &trade.outcome)
                    .await
                {
                    Ok(exists) => !exists,
                    Err(e) => {
                        // Left undecided so the next cycle re-evaluates it
                        tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to check existing take bet");
                        continue;
                    }
                }
            } else {
                false
            };

            match self.trades.set_take_bet(&trade.transaction_hash, take_bet).await {
                Ok(()) if take_bet => {
                    flagged += 1;
                    tracing::info!(
                        wallet = %wallet,
                        condition_id = %trade.condition_id,
                        outcome = %trade.outcome,
                        price = %trade.price,
                        follow_score = c.follow_score,
                        "Take bet flagged"
                    );
                }
                Ok(()) => {}
                Err(e) => {
                    tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to store take-bet flag");
                }
            }
        }

        (updated, flagged)
    }
}
