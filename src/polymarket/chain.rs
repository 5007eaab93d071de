use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// The node rejected the call; the message is the node's text verbatim.
    #[error("{0}")]
    Reverted(String),
}

/// Read-only access to a Polygon JSON-RPC node.
#[derive(Clone)]
pub struct ChainClient {
    provider: DynProvider,
}

impl ChainClient {
    pub fn connect(rpc_url: &str) -> Result<Self, ChainError> {
        let url = reqwest::Url::parse(rpc_url).map_err(|e| ChainError::InvalidUrl(e.to_string()))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self { provider })
    }

    /// Execute `data` against `to` as an `eth_call` from `from`.
    ///
    /// Nothing is broadcast; a revert surfaces as [`ChainError::Reverted`].
    pub async fn simulate(&self, from: Address, to: Address, data: Bytes) -> Result<(), ChainError> {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data);

        self.provider
            .call(tx)
            .await
            .map(|_| ())
            .map_err(|e| ChainError::Reverted(e.to_string()))
    }
}
