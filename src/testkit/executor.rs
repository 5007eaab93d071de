use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::claims::{ExecutorError, RedeemCall, TransactionExecutor};
use crate::polymarket::SubmittedTransaction;

/// Outcome of one scripted batch submission.
#[derive(Debug, Clone)]
pub enum BatchScript {
    /// Submission accepted and confirmed with this hash.
    Confirm(String),
    /// Submission rejected with this relayer text.
    Reject(String),
    /// Submission accepted, poll ends without a hash.
    NeverConfirm,
}

#[derive(Default)]
struct State {
    reverts: HashMap<String, String>,
    batches: VecDeque<BatchScript>,
    submitted: Vec<Vec<String>>,
    pending: HashMap<String, Option<String>>,
    simulated: Vec<String>,
}

/// In-memory [`TransactionExecutor`]. Batches confirm by default; scripted
/// outcomes are consumed in submission order.
#[derive(Default)]
pub struct ScriptedExecutor {
    state: Mutex<State>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make simulation of `condition_id` revert with `reason`.
    pub async fn revert_on(&self, condition_id: &str, reason: &str) {
        self.state
            .lock()
            .await
            .reverts
            .insert(condition_id.to_string(), reason.to_string());
    }

    pub async fn push_batch(&self, outcome: BatchScript) {
        self.state.lock().await.batches.push_back(outcome);
    }

    /// Condition ids of every submitted batch, in order.
    pub async fn submitted(&self) -> Vec<Vec<String>> {
        self.state.lock().await.submitted.clone()
    }

    pub async fn submission_count(&self) -> usize {
        self.state.lock().await.submitted.len()
    }

    pub async fn simulated(&self) -> Vec<String> {
        self.state.lock().await.simulated.clone()
    }
}

#[async_trait]
impl TransactionExecutor for ScriptedExecutor {
    async fn simulate_call(&self, call: &RedeemCall, _from: Address) -> Result<(), ExecutorError> {
        let mut state = self.state.lock().await;
        state.simulated.push(call.condition_id.clone());
        match state.reverts.get(&call.condition_id) {
            Some(reason) => Err(ExecutorError::Reverted(reason.clone())),
            None => Ok(()),
        }
    }

    async fn submit_batch(
        &self,
        calls: &[RedeemCall],
        _label: &str,
    ) -> Result<SubmittedTransaction, ExecutorError> {
        let mut state = self.state.lock().await;
        state
            .submitted
            .push(calls.iter().map(|c| c.condition_id.clone()).collect());
        let n = state.submitted.len();

        let script = state
            .batches
            .pop_front()
            .unwrap_or_else(|| BatchScript::Confirm(format!("0xtx{n}")));

        let transaction_id = format!("relay-{n}");
        match script {
            BatchScript::Reject(text) => return Err(ExecutorError::Relayer(text)),
            BatchScript::Confirm(hash) => {
                state.pending.insert(transaction_id.clone(), Some(hash));
            }
            BatchScript::NeverConfirm => {
                state.pending.insert(transaction_id.clone(), None);
            }
        }

        Ok(SubmittedTransaction {
            transaction_id,
            state: "STATE_NEW".to_string(),
        })
    }

    async fn poll_until_terminal(
        &self,
        transaction_id: &str,
        _success_states: &[&str],
        _fail_state: &str,
        _max_polls: u32,
        _interval: Duration,
    ) -> Result<Option<String>, ExecutorError> {
        Ok(self
            .state
            .lock()
            .await
            .pending
            .get(transaction_id)
            .cloned()
            .flatten())
    }
}
