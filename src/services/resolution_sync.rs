use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::db::TradeStore;
use crate::models::{profit_per_dollar, ResolutionUpdate, ResolvedStatus, Trade};
use crate::polymarket::{MarketDataGateway, MarketStatus};

/// A trade is rechecked once its last check is older than this.
pub const RECHECK_AFTER_MINUTES: i64 = 30;
pub const MAX_TRADES_PER_CYCLE: i64 = 1000;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    pub conditions: usize,
    pub resolved: usize,
    pub still_open: usize,
    pub not_found: usize,
}

/// Settle stored trades against their markets, one lookup per condition.
/// A failed lookup other than "not found" aborts the cycle.
pub async fn sync_resolutions(
    gateway: &dyn MarketDataGateway,
    trades: &dyn TradeStore,
    now: DateTime<Utc>,
) -> anyhow::Result<ResolutionReport> {
    let stale_before = now - ChronoDuration::minutes(RECHECK_AFTER_MINUTES);
    let due = trades
        .trades_due_for_resolution(stale_before, MAX_TRADES_PER_CYCLE)
        .await?;

    let mut by_condition: HashMap<String, Vec<Trade>> = HashMap::new();
    for trade in due {
        by_condition
            .entry(trade.condition_id.clone())
            .or_default()
            .push(trade);
    }

    let mut report = ResolutionReport {
        conditions: by_condition.len(),
        ..Default::default()
    };

    for (condition_id, group) in &by_condition {
        match gateway.fetch_market_status(condition_id).await? {
            None => {
                tracing::warn!(condition_id = %condition_id, "Market not found, will retry later");
                report.not_found += group.len();
                for trade in group {
                    mark_checked(trades, trade, now, None).await;
                }
            }
            Some(status) if status.resolved => {
                for trade in group {
                    let update = resolution_for(trade, &status);
                    match trades.set_resolution(&trade.transaction_hash, &update, now).await {
                        Ok(()) => report.resolved += 1,
                        Err(e) => {
                            tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to store resolution");
                        }
                    }
                }
                tracing::debug!(
                    condition_id = %condition_id,
                    winner = ?status.winning_outcome,
                    trades = group.len(),
                    "Market resolved"
                );
            }
            Some(status) => {
                report.still_open += group.len();
                for trade in group {
                    mark_checked(trades, trade, now, status.end_date).await;
                }
            }
        }
    }

    metrics::counter!("trades_resolved_total").increment(report.resolved as u64);

    tracing::info!(
        conditions = report.conditions,
        resolved = report.resolved,
        still_open = report.still_open,
        not_found = report.not_found,
        "Resolution sync complete"
    );

    Ok(report)
}

/// Won when the trade's outcome matches the winner, ignoring case.
pub fn resolution_for(trade: &Trade, status: &MarketStatus) -> ResolutionUpdate {
    let won = status
        .winning_outcome
        .as_deref()
        .is_some_and(|w| w.eq_ignore_ascii_case(&trade.outcome));
    let resolved_status = if won {
        ResolvedStatus::Won
    } else {
        ResolvedStatus::Lost
    };

    ResolutionUpdate {
        resolved_status,
        profit_per_dollar: trade
            .side()
            .and_then(|side| profit_per_dollar(side, trade.price, resolved_status)),
        market_end_date: status.end_date.or(trade.market_end_date),
    }
}

async fn mark_checked(
    trades: &dyn TradeStore,
    trade: &Trade,
    now: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
) {
    if let Err(e) = trades
        .mark_resolution_checked(&trade.transaction_hash, now, end_date)
        .await
    {
        tracing::warn!(tx = %trade.transaction_hash, error = %e, "Failed to stamp resolution check");
    }
}

pub async fn run_resolution_sync(
    gateway: Arc<dyn MarketDataGateway>,
    trades: Arc<dyn TradeStore>,
    period: std::time::Duration,
) {
    super::run_periodic("resolution_sync", period, move || {
        let gateway = gateway.clone();
        let trades = trades.clone();
        async move {
            sync_resolutions(gateway.as_ref(), trades.as_ref(), Utc::now()).await?;
            Ok(())
        }
    })
    .await;
}
