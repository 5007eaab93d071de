use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use thiserror::Error;

use super::calls::{encode_batch, RedeemCall};
use crate::polymarket::{ChainClient, RelayerClient, SubmittedTransaction};

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Simulation revert, node text verbatim.
    #[error("{0}")]
    Reverted(String),

    /// Relayer submission or status failure, relayer text verbatim.
    #[error("{0}")]
    Relayer(String),
}

/// Blockchain side of claiming: read-only simulation, relayed batch
/// submission and confirmation polling.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn simulate_call(&self, call: &RedeemCall, from: Address) -> Result<(), ExecutorError>;

    async fn submit_batch(
        &self,
        calls: &[RedeemCall],
        label: &str,
    ) -> Result<SubmittedTransaction, ExecutorError>;

    /// Transaction hash once a success state is reached; `None` on the fail
    /// state or when polls run out.
    async fn poll_until_terminal(
        &self,
        transaction_id: &str,
        success_states: &[&str],
        fail_state: &str,
        max_polls: u32,
        interval: Duration,
    ) -> Result<Option<String>, ExecutorError>;
}

/// `eth_call` simulation through a Polygon node, submission through the
/// builder relayer.
pub struct RelayerExecutor {
    chain: ChainClient,
    relayer: RelayerClient,
}

impl RelayerExecutor {
    pub fn new(chain: ChainClient, relayer: RelayerClient) -> Self {
        Self { chain, relayer }
    }
}

#[async_trait]
impl TransactionExecutor for RelayerExecutor {
    async fn simulate_call(&self, call: &RedeemCall, from: Address) -> Result<(), ExecutorError> {
        self.chain
            .simulate(from, call.to, call.data.clone())
            .await
            .map_err(|e| ExecutorError::Reverted(e.to_string()))
    }

    async fn submit_batch(
        &self,
        calls: &[RedeemCall],
        label: &str,
    ) -> Result<SubmittedTransaction, ExecutorError> {
        self.relayer
            .submit(encode_batch(calls), label)
            .await
            .map_err(|e| ExecutorError::Relayer(e.to_string()))
    }

    async fn poll_until_terminal(
        &self,
        transaction_id: &str,
        success_states: &[&str],
        fail_state: &str,
        max_polls: u32,
        interval: Duration,
    ) -> Result<Option<String>, ExecutorError> {
        self.relayer
            .poll_until_terminal(transaction_id, success_states, fail_state, max_polls, interval)
            .await
            .map_err(|e| ExecutorError::Relayer(e.to_string()))
    }
}
