use std::sync::Arc;

use super::classification::{ClassificationService, ClassifyReport};
use crate::db::TradeStore;

/// Unclassified trades considered per backfill cycle.
pub const BACKFILL_TRADE_LIMIT: i64 = 100;

/// Classify wallets behind stored trades that have no classification yet.
pub async fn sync_classifications(
    trades: &dyn TradeStore,
    classifier: &ClassificationService,
) -> anyhow::Result<ClassifyReport> {
    let wallets = trades.unclassified_wallets(BACKFILL_TRADE_LIMIT).await?;
    if wallets.is_empty() {
        tracing::debug!("No unclassified trades");
        return Ok(ClassifyReport::default());
    }

    let report = classifier.classify_and_apply(&wallets).await;

    tracing::info!(
        wallets = wallets.len(),
        classified = report.classified,
        failed = report.failed,
        trades_updated = report.trades_updated,
        take_bets = report.take_bets,
        "Classification backfill complete"
    );

    Ok(report)
}

pub async fn run_classification_sync(
    trades: Arc<dyn TradeStore>,
    classifier: Arc<ClassificationService>,
    period: std::time::Duration,
) {
    super::run_periodic("classification_sync", period, move || {
        let trades = trades.clone();
        let classifier = classifier.clone();
        async move {
            sync_classifications(trades.as_ref(), &classifier).await?;
            Ok(())
        }
    })
    .await;
}
