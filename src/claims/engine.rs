use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;

use super::calls::{redeem_call, MAX_BATCH_SIZE};
use super::executor::TransactionExecutor;
use super::rate_limit::RateLimitStatus;
use super::session::ClaimSession;
use super::ClaimError;
use crate::db::ClaimLog;
use crate::models::{ClaimStatus, ClaimablePosition, NewClaimLogEntry};
use crate::polymarket::{ApiPosition, MarketDataGateway};

pub const SUCCESS_STATES: [&str; 2] = ["STATE_MINED", "STATE_CONFIRMED"];
pub const FAIL_STATE: &str = "STATE_FAILED";

/// Confirmation polling for submitted batches.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub max_polls: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_polls: 60,
            interval: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidPosition {
    pub condition_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PreValidation {
    pub valid: Vec<ClaimablePosition>,
    pub invalid: Vec<InvalidPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionOutcome {
    pub condition_id: String,
    pub status: ClaimStatus,
    pub value: Decimal,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
}

impl PositionOutcome {
    pub fn success(&self) -> bool {
        self.status == ClaimStatus::Claimed
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchClaimResult {
    /// Every position was claimed.
    pub success: bool,
    /// Hash of the last confirmed batch.
    pub tx_hash: Option<String>,
    /// First failure seen.
    pub error: Option<String>,
    pub rate_limited: bool,
    /// Relayer submissions spent.
    pub submissions: usize,
    pub positions: Vec<PositionOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    NotConfigured,
    RateLimited,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimRunSummary {
    pub status: RunStatus,
    /// Claimable positions found upstream.
    pub total: usize,
    pub already_claimed: usize,
    pub claimed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub rate_limited: bool,
    pub claimed_value: Decimal,
    pub tx_hash: Option<String>,
    pub results: Vec<PositionOutcome>,
}

impl ClaimRunSummary {
    fn empty(status: RunStatus) -> Self {
        Self {
            status,
            total: 0,
            already_claimed: 0,
            claimed: 0,
            failed: 0,
            skipped: 0,
            rate_limited: status == RunStatus::RateLimited,
            claimed_value: Decimal::ZERO,
            tx_hash: None,
            results: Vec::new(),
        }
    }

    fn count(&self, status: ClaimStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Discovers redeemable positions for the funder wallet and redeems them in
/// relayed batches, recording every attempt in the claim log.
///
/// Cycles are serialized: `claim_all_winning` and `claim_positions_batched`
/// hold the engine's cycle lock for their whole run.
pub struct ClaimEngine {
    gateway: Arc<dyn MarketDataGateway>,
    claim_log: Arc<dyn ClaimLog>,
    session: ClaimSession,
    poll: PollSettings,
    cycle: Mutex<()>,
}

impl ClaimEngine {
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        claim_log: Arc<dyn ClaimLog>,
        session: ClaimSession,
    ) -> Self {
        Self {
            gateway,
            claim_log,
            session,
            poll: PollSettings::default(),
            cycle: Mutex::new(()),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn session(&self) -> &ClaimSession {
        &self.session
    }

    pub fn is_claiming_configured(&self) -> bool {
        self.session.is_configured()
    }

    pub async fn is_rate_limited(&self) -> bool {
        self.is_rate_limited_at(Utc::now()).await
    }

    pub async fn is_rate_limited_at(&self, now: DateTime<Utc>) -> bool {
        let limited = self.session.is_rate_limited_at(now).await;
        metrics::gauge!("claim_rate_limited").set(if limited { 1.0 } else { 0.0 });
        limited
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.session.rate_limit_status_at(Utc::now()).await
    }

    /// Arm the relayer quota backoff from an error message.
    pub async fn handle_rate_limit_error(&self, message: &str) -> DateTime<Utc> {
        self.handle_rate_limit_error_at(message, Utc::now()).await
    }

    pub async fn handle_rate_limit_error_at(&self, message: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let reset_at = self.session.record_rate_limit_at(message, now).await;
        metrics::counter!("relayer_rate_limits_total").increment(1);
        metrics::gauge!("claim_rate_limited").set(1.0);
        tracing::warn!(reset_at = %reset_at, error = %message, "Relayer rate limited");
        reset_at
    }

    // -----------------------------------------------------------------------
    // Discovery + pre-validation
    // -----------------------------------------------------------------------

    /// Redeemable positions of the funder wallet with a non-zero value.
    pub async fn get_claimable_positions(&self) -> Result<Vec<ClaimablePosition>, ClaimError> {
        let funder = self.session.funder().ok_or(ClaimError::NotConfigured)?;
        let positions = self
            .gateway
            .fetch_positions(&funder.to_string(), true)
            .await?;

        Ok(positions
            .iter()
            .map(to_claimable)
            .filter(ClaimablePosition::is_claimable)
            .collect())
    }

    /// Simulate each redeem from the funder; reverting positions are split
    /// off with the revert text.
    pub async fn pre_validate_positions(
        &self,
        positions: &[ClaimablePosition],
    ) -> Result<PreValidation, ClaimError> {
        let funder = self.session.funder().ok_or(ClaimError::NotConfigured)?;
        let executor = self.session.executor().await?;
        let mut outcome = PreValidation::default();

        for position in positions {
            let check = match redeem_call(position) {
                Ok(call) => executor
                    .simulate_call(&call, funder)
                    .await
                    .map_err(|e| ClaimError::PreValidationFailed(e.to_string())),
                Err(e) => Err(ClaimError::PreValidationFailed(e.to_string())),
            };

            match check {
                Ok(()) => outcome.valid.push(position.clone()),
                Err(e) => {
                    tracing::debug!(condition_id = %position.condition_id, error = %e, "Redeem simulation failed");
                    outcome.invalid.push(InvalidPosition {
                        condition_id: position.condition_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Claiming
    // -----------------------------------------------------------------------

    /// Claim `positions` in batches, skipping conditions already claimed.
    pub async fn claim_positions_batched(
        &self,
        positions: &[ClaimablePosition],
    ) -> Result<BatchClaimResult, ClaimError> {
        let _cycle = self.cycle.lock().await;
        let (fresh, _) = self.drop_already_claimed(positions.to_vec()).await?;
        self.execute_batches(&fresh).await
    }

    /// One full claim cycle over every claimable position.
    pub async fn claim_all_winning(&self) -> Result<ClaimRunSummary, ClaimError> {
        let _cycle = self.cycle.lock().await;

        if !self.is_claiming_configured() {
            tracing::info!("Claiming not configured, skipping");
            return Ok(ClaimRunSummary::empty(RunStatus::NotConfigured));
        }
        if self.is_rate_limited().await {
            let status = self.get_rate_limit_status().await;
            tracing::info!(resets_in = ?status.resets_in, "Relayer still rate limited, skipping claim cycle");
            return Ok(ClaimRunSummary::empty(RunStatus::RateLimited));
        }

        let candidates = merge_by_condition(self.get_claimable_positions().await?);
        let mut summary = ClaimRunSummary::empty(RunStatus::Completed);
        summary.total = candidates.len();

        let (fresh, already_claimed) = self.drop_already_claimed(candidates).await?;
        summary.already_claimed = already_claimed;
        if fresh.is_empty() {
            tracing::info!(total = summary.total, already_claimed, "Nothing to claim");
            return Ok(summary);
        }

        let checked = self.pre_validate_positions(&fresh).await?;
        for invalid in &checked.invalid {
            if let Some(position) = fresh.iter().find(|p| p.condition_id == invalid.condition_id) {
                let outcome = self
                    .record(position, ClaimStatus::Skipped, None, Some(invalid.error.clone()))
                    .await;
                summary.results.push(outcome);
            }
        }

        let batch = self.execute_batches(&checked.valid).await?;
        summary.rate_limited = batch.rate_limited;
        summary.tx_hash = batch.tx_hash;
        summary.results.extend(batch.positions);

        summary.claimed = summary.count(ClaimStatus::Claimed);
        summary.failed = summary.count(ClaimStatus::Failed);
        summary.skipped = summary.count(ClaimStatus::Skipped);
        summary.claimed_value = summary
            .results
            .iter()
            .filter(|r| r.success())
            .map(|r| r.value)
            .sum();

        tracing::info!(
            total = summary.total,
            already_claimed = summary.already_claimed,
            claimed = summary.claimed,
            failed = summary.failed,
            skipped = summary.skipped,
            claimed_value = %summary.claimed_value,
            rate_limited = summary.rate_limited,
            "Claim cycle complete"
        );

        Ok(summary)
    }

    /// Split off conditions that already have a `claimed` log row.
    async fn drop_already_claimed(
        &self,
        positions: Vec<ClaimablePosition>,
    ) -> Result<(Vec<ClaimablePosition>, usize), ClaimError> {
        if positions.is_empty() {
            return Ok((positions, 0));
        }

        let ids: Vec<String> = positions.iter().map(|p| p.condition_id.clone()).collect();
        let claimed = self
            .claim_log
            .claimed_condition_ids(&ids)
            .await
            .map_err(ClaimError::Store)?;

        let before = positions.len();
        let fresh: Vec<ClaimablePosition> = positions
            .into_iter()
            .filter(|p| !claimed.contains(&p.condition_id))
            .collect();
        let dropped = before - fresh.len();
        if dropped > 0 {
            tracing::debug!(count = dropped, "Skipping already-claimed conditions");
        }

        Ok((fresh, dropped))
    }

    async fn execute_batches(
        &self,
        positions: &[ClaimablePosition],
    ) -> Result<BatchClaimResult, ClaimError> {
        let mut result = BatchClaimResult::default();
        if positions.is_empty() {
            result.success = true;
            return Ok(result);
        }

        // Nothing is attempted, so nothing is logged.
        if self.is_rate_limited().await {
            result.rate_limited = true;
            result.error = Some("relayer rate limited".to_string());
            return Ok(result);
        }

        let executor = self.session.executor().await?;
        let chunks: Vec<&[ClaimablePosition]> = positions.chunks(MAX_BATCH_SIZE).collect();

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 && self.is_rate_limited().await {
                self.fail_remaining(&mut result, &chunks[index..], "relayer rate limited".to_string())
                    .await;
                break;
            }

            tracing::info!(
                batch = index + 1,
                of = chunks.len(),
                positions = chunk.len(),
                "Submitting redeem batch"
            );

            match self
                .execute_chunk(executor.as_ref(), chunk, &mut result.submissions)
                .await
            {
                Ok(tx_hash) => {
                    for position in chunk.iter() {
                        let outcome = self
                            .record(position, ClaimStatus::Claimed, Some(tx_hash.clone()), None)
                            .await;
                        result.positions.push(outcome);
                    }
                    result.tx_hash = Some(tx_hash);
                }
                Err(ClaimError::RateLimited(message)) => {
                    self.handle_rate_limit_error(&message).await;
                    self.fail_remaining(&mut result, &chunks[index..], message).await;
                    break;
                }
                Err(e @ ClaimError::OracleNotReady(_)) => {
                    tracing::info!(batch = index + 1, error = %e, "Oracle result not posted yet, retrying next cycle");
                    self.record_chunk(&mut result, chunk, ClaimStatus::Skipped, e.to_string())
                        .await;
                }
                Err(e) => {
                    tracing::error!(batch = index + 1, error = %e, "Redeem batch failed");
                    self.record_chunk(&mut result, chunk, ClaimStatus::Failed, e.to_string())
                        .await;
                }
            }
        }

        result.success = result.positions.iter().all(PositionOutcome::success);
        Ok(result)
    }

    /// Submit one chunk and wait for it to confirm. Returns the tx hash.
    async fn execute_chunk(
        &self,
        executor: &dyn TransactionExecutor,
        chunk: &[ClaimablePosition],
        submissions: &mut usize,
    ) -> Result<String, ClaimError> {
        let calls = chunk
            .iter()
            .map(redeem_call)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ClaimError::TransactionFailed(e.to_string()))?;
        let label = format!("Redeem {} position(s)", calls.len());

        *submissions += 1;
        metrics::counter!("relayer_submissions_total").increment(1);
        let submitted = executor
            .submit_batch(&calls, &label)
            .await
            .map_err(|e| ClaimError::from_relayer_text(e.to_string()))?;

        let tx_hash = executor
            .poll_until_terminal(
                &submitted.transaction_id,
                &SUCCESS_STATES,
                FAIL_STATE,
                self.poll.max_polls,
                self.poll.interval,
            )
            .await
            .map_err(|e| ClaimError::from_relayer_text(e.to_string()))?;

        tx_hash.ok_or_else(|| {
            ClaimError::TransactionFailed(format!(
                "transaction {} failed or did not confirm",
                submitted.transaction_id
            ))
        })
    }

    async fn fail_remaining(
        &self,
        result: &mut BatchClaimResult,
        chunks: &[&[ClaimablePosition]],
        message: String,
    ) {
        result.rate_limited = true;
        for chunk in chunks {
            self.record_chunk(result, chunk, ClaimStatus::Failed, message.clone())
                .await;
        }
    }

    async fn record_chunk(
        &self,
        result: &mut BatchClaimResult,
        chunk: &[ClaimablePosition],
        status: ClaimStatus,
        message: String,
    ) {
        result.error.get_or_insert_with(|| message.clone());
        for position in chunk {
            let outcome = self.record(position, status, None, Some(message.clone())).await;
            result.positions.push(outcome);
        }
    }

    /// Append one claim-log row. Store failures are logged, not propagated.
    async fn record(
        &self,
        position: &ClaimablePosition,
        status: ClaimStatus,
        tx_hash: Option<String>,
        error: Option<String>,
    ) -> PositionOutcome {
        let entry = NewClaimLogEntry::for_position(position, status, tx_hash.clone(), error.clone());
        if let Err(e) = self.claim_log.record_claim(&entry).await {
            tracing::warn!(condition_id = %position.condition_id, status = %status, error = %e, "Failed to write claim log");
        }
        metrics::counter!("claims_total", "status" => status.as_str()).increment(1);

        PositionOutcome {
            condition_id: position.condition_id.clone(),
            status,
            value: position.current_value,
            tx_hash,
            error,
        }
    }
}

pub fn to_claimable(p: &ApiPosition) -> ClaimablePosition {
    ClaimablePosition {
        condition_id: p.condition_id.clone(),
        slug: p.slug.clone(),
        title: p.title.clone(),
        outcome: p.outcome.clone(),
        size: p.size,
        avg_price: p.avg_price,
        cur_price: p.cur_price,
        current_value: p.current_value,
        realized_pnl: p.realized_pnl,
        negative_risk: p.negative_risk,
        redeemable: p.redeemable,
    }
}

/// One entry per condition, in first-seen order; one redeem settles every
/// outcome of a condition, so values are summed.
fn merge_by_condition(positions: Vec<ClaimablePosition>) -> Vec<ClaimablePosition> {
    let mut seen = HashSet::new();
    let mut merged: Vec<ClaimablePosition> = Vec::with_capacity(positions.len());

    for position in positions {
        if seen.insert(position.condition_id.clone()) {
            merged.push(position);
        } else if let Some(existing) = merged
            .iter_mut()
            .find(|m| m.condition_id == position.condition_id)
        {
            existing.current_value += position.current_value;
        }
    }
    merged
}
