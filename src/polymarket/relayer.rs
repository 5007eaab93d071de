use std::time::Duration;

use alloy::hex;
use alloy::primitives::{keccak256, Address, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::auth::{AuthError, BuilderAuth};
use super::http::build_url;

pub const RELAYER_BASE: &str = "https://relayer-v2.polymarket.com";

/// Polymarket proxy wallet factory on Polygon. Relayed PROXY transactions
/// are calls to `proxy(ProxyCall[])` on this contract.
pub const PROXY_FACTORY_ADDRESS: Address =
    alloy::primitives::address!("aB45c5A4B0c941a2F231C04C3f49182e1A254052");

/// Relay hub the relayer forwards PROXY transactions through.
const RELAY_HUB_ADDRESS: Address =
    alloy::primitives::address!("D216153c06E857cD7f72665E0aF1d7D82172F494");

const RELAY_GAS_LIMIT: u64 = 10_000_000;

#[derive(Debug, Error)]
pub enum RelayerError {
    #[error("relayer request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response. The body is kept verbatim: quota and oracle errors
    /// are only distinguishable by their text.
    #[error("relayer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("relayer auth failed: {0}")]
    Auth(#[from] AuthError),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("unexpected relayer response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Deserialize)]
struct RelayPayload {
    address: String,
    nonce: String,
}

/// Relayer acknowledgement of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub transaction_id: String,
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayerTransaction {
    #[serde(default, alias = "transactionID")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Gas-sponsored transaction submission through the builder relayer.
pub struct RelayerClient {
    http: Client,
    base_url: String,
    auth: BuilderAuth,
    signer: PrivateKeySigner,
    proxy_wallet: Address,
}

impl RelayerClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        auth: BuilderAuth,
        signer: PrivateKeySigner,
        proxy_wallet: Address,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth,
            signer,
            proxy_wallet,
        }
    }

    async fn relay_payload(&self) -> Result<RelayPayload, RelayerError> {
        let url = build_url(
            &self.base_url,
            "/relay-payload",
            &[
                ("address", self.signer.address().to_string()),
                ("type", "PROXY".into()),
            ],
        )
        .map_err(|e| RelayerError::Unexpected(e.to_string()))?;

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RelayerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RelayerError::Unexpected(format!("{e}: {body}")))
    }

    /// Submit `data` as a PROXY transaction to the proxy factory.
    pub async fn submit(&self, data: Bytes, metadata: &str) -> Result<SubmittedTransaction, RelayerError> {
        let payload = self.relay_payload().await?;
        let relay: Address = payload
            .address
            .parse()
            .map_err(|_| RelayerError::Unexpected(format!("bad relay address {}", payload.address)))?;
        let nonce: U256 = payload
            .nonce
            .parse()
            .map_err(|_| RelayerError::Unexpected(format!("bad relay nonce {}", payload.nonce)))?;

        let from = self.signer.address();
        let struct_hash = proxy_struct_hash(from, &data, nonce, relay);
        let signature = self
            .signer
            .sign_message(struct_hash.as_slice())
            .await
            .map_err(|e| RelayerError::Signing(e.to_string()))?;

        let body = json!({
            "type": "PROXY",
            "from": from.to_string(),
            "to": PROXY_FACTORY_ADDRESS.to_string(),
            "proxyWallet": self.proxy_wallet.to_string(),
            "data": hex::encode_prefixed(&data),
            "nonce": payload.nonce,
            "signature": hex::encode_prefixed(signature.as_bytes()),
            "signatureParams": {
                "gasPrice": "0",
                "gasLimit": RELAY_GAS_LIMIT.to_string(),
                "relayerFee": "0",
                "relayHub": RELAY_HUB_ADDRESS.to_string(),
                "relay": relay.to_string(),
            },
            "metadata": metadata,
        })
        .to_string();

        let url = build_url(&self.base_url, "/submit", &[])
            .map_err(|e| RelayerError::Unexpected(e.to_string()))?;
        let mut req = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.clone());
        for (name, value) in self.auth.headers("POST", "/submit", &body)? {
            req = req.header(name, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RelayerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let ack: RelayerTransaction = serde_json::from_str(&text)
            .map_err(|e| RelayerError::Unexpected(format!("{e}: {text}")))?;
        let transaction_id = ack
            .transaction_id
            .ok_or_else(|| RelayerError::Unexpected(format!("missing transactionID: {text}")))?;

        tracing::info!(transaction_id = %transaction_id, state = %ack.state, "Relayer transaction submitted");

        Ok(SubmittedTransaction {
            transaction_id,
            state: ack.state,
        })
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> Result<Option<RelayerTransaction>, RelayerError> {
        let url = build_url(
            &self.base_url,
            "/transaction",
            &[("id", transaction_id.to_string())],
        )
        .map_err(|e| RelayerError::Unexpected(e.to_string()))?;

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RelayerError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let txns: Vec<RelayerTransaction> = serde_json::from_str(&text)
            .map_err(|e| RelayerError::Unexpected(format!("{e}: {text}")))?;
        Ok(txns.into_iter().next())
    }

    /// Poll until the transaction reaches one of `success_states` with a
    /// transaction hash (returns the hash), reaches `fail_state` or STATE_INVALID (returns `None`), or
    /// `max_polls` is exhausted (returns `None`).
    pub async fn poll_until_terminal(
        &self,
        transaction_id: &str,
        success_states: &[&str],
        fail_state: &str,
        max_polls: u32,
        interval: Duration,
    ) -> Result<Option<String>, RelayerError> {
        for attempt in 1..=max_polls {
            tokio::time::sleep(interval).await;

            let txn = match self.get_transaction(transaction_id).await {
                Ok(Some(t)) => t,
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, transaction_id, attempt, "Relayer poll failed, retrying");
                    continue;
                }
            };

            match poll_step(&txn, success_states, fail_state) {
                PollStep::Confirmed(hash) => return Ok(Some(hash)),
                PollStep::Failed => {
                    tracing::warn!(transaction_id, state = %txn.state, "Relayer transaction failed");
                    return Ok(None);
                }
                PollStep::Pending => {
                    tracing::debug!(transaction_id, state = %txn.state, attempt, "Relayer transaction pending");
                }
            }
        }

        tracing::warn!(transaction_id, max_polls, "Relayer transaction did not confirm in time");
        Ok(None)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PollStep {
    Confirmed(String),
    Failed,
    Pending,
}

/// A success state only confirms once the relayer also reports the hash.
fn poll_step(txn: &RelayerTransaction, success_states: &[&str], fail_state: &str) -> PollStep {
    if success_states.contains(&txn.state.as_str()) {
        return match txn.transaction_hash.as_deref().filter(|h| !h.is_empty()) {
            Some(hash) => PollStep::Confirmed(hash.to_string()),
            None => PollStep::Pending,
        };
    }
    if txn.state == fail_state || txn.state == "STATE_INVALID" {
        return PollStep::Failed;
    }
    PollStep::Pending
}

/// keccak256("rlx:" ‖ from ‖ to ‖ data ‖ relayerFee ‖ gasPrice ‖ gasLimit ‖ nonce ‖ relayHub ‖ relay)
fn proxy_struct_hash(from: Address, data: &Bytes, nonce: U256, relay: Address) -> alloy::primitives::B256 {
    let mut preimage = Vec::with_capacity(4 + 20 * 4 + 32 * 4 + data.len());
    preimage.extend_from_slice(b"rlx:");
    preimage.extend_from_slice(from.as_slice());
    preimage.extend_from_slice(PROXY_FACTORY_ADDRESS.as_slice());
    preimage.extend_from_slice(data);
    preimage.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
    preimage.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
    preimage.extend_from_slice(&U256::from(RELAY_GAS_LIMIT).to_be_bytes::<32>());
    preimage.extend_from_slice(&nonce.to_be_bytes::<32>());
    preimage.extend_from_slice(RELAY_HUB_ADDRESS.as_slice());
    preimage.extend_from_slice(relay.as_slice());
    keccak256(preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_hash_depends_on_nonce_and_data() {
        let from = Address::repeat_byte(0x11);
        let relay = Address::repeat_byte(0x22);
        let data = Bytes::from(vec![1u8, 2, 3]);

        let a = proxy_struct_hash(from, &data, U256::from(1), relay);
        let b = proxy_struct_hash(from, &data, U256::from(2), relay);
        let c = proxy_struct_hash(from, &Bytes::from(vec![9u8]), U256::from(1), relay);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, proxy_struct_hash(from, &data, U256::from(1), relay));
    }

    #[test]
    fn transaction_status_accepts_both_id_spellings() {
        let a: RelayerTransaction =
            serde_json::from_str(r#"{"transactionID": "abc", "state": "STATE_NEW"}"#).unwrap();
        let b: RelayerTransaction =
            serde_json::from_str(r#"{"transactionId": "abc", "state": "STATE_MINED", "transactionHash": "0x1"}"#)
                .unwrap();
        assert_eq!(a.transaction_id.as_deref(), Some("abc"));
        assert_eq!(b.transaction_id.as_deref(), Some("abc"));
        assert_eq!(b.transaction_hash.as_deref(), Some("0x1"));
    }

    #[test]
    fn success_without_hash_keeps_polling() {
        let txn = |state: &str, hash: Option<&str>| RelayerTransaction {
            transaction_id: Some("abc".into()),
            state: state.into(),
            transaction_hash: hash.map(str::to_string),
        };
        let success = ["STATE_MINED", "STATE_CONFIRMED"];

        assert_eq!(poll_step(&txn("STATE_MINED", None), &success, "STATE_FAILED"), PollStep::Pending);
        assert_eq!(poll_step(&txn("STATE_MINED", Some("")), &success, "STATE_FAILED"), PollStep::Pending);
        assert_eq!(
            poll_step(&txn("STATE_CONFIRMED", Some("0xfeed")), &success, "STATE_FAILED"),
            PollStep::Confirmed("0xfeed".into())
        );
        assert_eq!(poll_step(&txn("STATE_FAILED", None), &success, "STATE_FAILED"), PollStep::Failed);
        assert_eq!(poll_step(&txn("STATE_INVALID", None), &success, "STATE_FAILED"), PollStep::Failed);
        assert_eq!(poll_step(&txn("STATE_NEW", None), &success, "STATE_FAILED"), PollStep::Pending);
    }

    #[test]
    fn status_error_keeps_body_verbatim() {
        let err = RelayerError::Status {
            status: 429,
            body: "quota exceeded: 0 units remaining, resets in 120 seconds".into(),
        };
        assert_eq!(
            err.to_string(),
            "relayer returned 429: quota exceeded: 0 units remaining, resets in 120 seconds"
        );
    }
}
