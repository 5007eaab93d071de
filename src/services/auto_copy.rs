use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::db::BetLog;
use crate::models::{BetStatus, NewBet, Trade};
use crate::polymarket::{PlacedOrder, TradingClient};

/// Take bets considered per copy cycle.
pub const COPY_BATCH_LIMIT: i64 = 50;

/// Places the limit BUY that mirrors a take bet.
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
    ) -> anyhow::Result<PlacedOrder>;
}

#[async_trait]
impl OrderPlacer for TradingClient {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
    ) -> anyhow::Result<PlacedOrder> {
        TradingClient::place_limit_buy(self, token_id, size, price).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub placed: usize,
    pub dry_run: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Shares bought for `usd` at `price`, rounded down to cents.
pub fn copy_size(usd: Decimal, price: Decimal) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }
    let size = (usd / price).round_dp_with_strategy(2, RoundingStrategy::ToZero);
    (size > Decimal::ZERO).then_some(size)
}

/// Mirror every take bet without a bet-log row. With no placer, or in dry-run
/// mode, the bet is logged as `dry_run` instead of sent.
pub async fn copy_take_bets(
    bets: &dyn BetLog,
    placer: Option<&dyn OrderPlacer>,
    usd: Decimal,
    dry_run: bool,
) -> anyhow::Result<CopyReport> {
    let pending = bets.uncopied_take_bets(COPY_BATCH_LIMIT).await?;
    let mut report = CopyReport::default();

    for trade in &pending {
        let Some(size) = copy_size(usd, trade.price) else {
            report.skipped += 1;
            continue;
        };

        let bet = match placer.filter(|_| !dry_run) {
            None => {
                tracing::info!(
                    tx = %trade.transaction_hash,
                    condition_id = %trade.condition_id,
                    outcome = %trade.outcome,
                    size = %size,
                    price = %trade.price,
                    "[DRY RUN] Would copy take bet"
                );
                report.dry_run += 1;
                new_bet(trade, size, BetStatus::DryRun, None, None)
            }
            Some(placer) => match placer.place_limit_buy(&trade.asset, size, trade.price).await {
                Ok(order) => {
                    report.placed += 1;
                    new_bet(trade, size, BetStatus::Placed, Some(order.order_id), None)
                }
                Err(e) => {
                    tracing::warn!(tx = %trade.transaction_hash, error = %e, "Copy order failed");
                    report.failed += 1;
                    new_bet(trade, size, BetStatus::Failed, None, Some(e.to_string()))
                }
            },
        };

        if let Err(e) = bets.record_bet(&bet).await {
            tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to record bet");
        }
        metrics::counter!("bets_copied_total", "status" => bet.status.as_str()).increment(1);
    }

    if !pending.is_empty() {
        tracing::info!(
            placed = report.placed,
            dry_run = report.dry_run,
            failed = report.failed,
            skipped = report.skipped,
            "Auto-copy cycle complete"
        );
    }

    Ok(report)
}

fn new_bet(
    trade: &Trade,
    size: Decimal,
    status: BetStatus,
    order_id: Option<String>,
    error: Option<String>,
) -> NewBet {
    NewBet {
        transaction_hash: trade.transaction_hash.clone(),
        condition_id: trade.condition_id.clone(),
        outcome: trade.outcome.clone(),
        price: trade.price,
        size,
        status,
        order_id,
        error,
    }
}

pub async fn run_auto_copy(
    bets: Arc<dyn BetLog>,
    placer: Option<Arc<dyn OrderPlacer>>,
    usd: Decimal,
    dry_run: bool,
    period: Duration,
) {
    super::run_periodic("auto_copy", period, move || {
        let bets = bets.clone();
        let placer = placer.clone();
        async move {
            copy_take_bets(bets.as_ref(), placer.as_deref(), usd, dry_run).await?;
            Ok(())
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn size_is_usd_over_price_rounded_down() {
        assert_eq!(copy_size(dec!(10), dec!(0.3)), Some(dec!(33.33)));
        assert_eq!(copy_size(dec!(10), dec!(0.5)), Some(dec!(20)));
    }

    #[test]
    fn non_positive_price_has_no_size() {
        assert_eq!(copy_size(dec!(10), Decimal::ZERO), None);
        assert_eq!(copy_size(dec!(0), dec!(0.5)), None);
    }
}
