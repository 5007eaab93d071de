use std::sync::Arc;
use std::time::Duration;

use crate::claims::ClaimEngine;

/// Periodic claim cycle. "Not configured" and "rate limited" come back as
/// summaries, so only upstream and store failures reach the scheduler.
pub async fn run_claim_sync(engine: Arc<ClaimEngine>, period: Duration) {
    super::run_periodic("claim_sync", period, move || {
        let engine = engine.clone();
        async move {
            engine.claim_all_winning().await?;
            Ok(())
        }
    })
    .await;
}
