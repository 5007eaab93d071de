use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::{Normal, Signer as _};
use polymarket_client_sdk::clob::client::{Client, Config};
use polymarket_client_sdk::clob::types::Side as SdkSide;
use polymarket_client_sdk::types::U256;
use polymarket_client_sdk::POLYGON;
use rust_decimal::Decimal;

const CLOB_HOST: &str = "https://clob.polymarket.com";

type AuthenticatedClient = Client<Authenticated<Normal>>;

/// Order placement against the CLOB with an authenticated SDK client.
///
/// The private key is parsed once at construction and never kept as a string.
pub struct TradingClient {
    signer: PrivateKeySigner,
    client: AuthenticatedClient,
}

/// Identifier and status the CLOB returned for a posted order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: String,
    pub status: String,
}

impl TradingClient {
    /// Authenticate against the CLOB, deriving or creating an API key.
    pub async fn connect(private_key: &str) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key)?.with_chain_id(Some(POLYGON));

        let unauthenticated = Client::new(CLOB_HOST, Config::default())?;
        let client = unauthenticated
            .authentication_builder(&signer)
            .authenticate()
            .await?;

        tracing::info!(address = %client.address(), "CLOB trading client authenticated");

        Ok(Self { signer, client })
    }

    pub fn wallet_address(&self) -> String {
        format!("{}", self.client.address())
    }

    /// Place a limit BUY for `size` shares of `token_id` at `price`.
    pub async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
    ) -> anyhow::Result<PlacedOrder> {
        let token = parse_token_id(token_id)?;

        let signable = self
            .client
            .limit_order()
            .token_id(token)
            .side(SdkSide::Buy)
            .price(price)
            .size(size)
            .build()
            .await?;

        let signed = self.client.sign(&self.signer, signable).await?;
        let response = self.client.post_order(signed).await?;

        tracing::info!(
            order_id = ?response.order_id,
            status = ?response.status,
            token_id,
            size = %size,
            price = %price,
            "Copy order submitted to CLOB"
        );

        Ok(PlacedOrder {
            order_id: format!("{:?}", response.order_id),
            status: format!("{:?}", response.status),
        })
    }
}

/// CTF token ids arrive as decimal strings; accept hex as a fallback.
fn parse_token_id(token_id: &str) -> anyhow::Result<U256> {
    if let Ok(v) = U256::from_str_radix(token_id, 10) {
        return Ok(v);
    }
    let hex = token_id.strip_prefix("0x").unwrap_or(token_id);
    Ok(U256::from_str_radix(hex, 16)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_id_decimal_and_hex() {
        assert_eq!(parse_token_id("255").unwrap(), U256::from(255u64));
        assert_eq!(parse_token_id("0xff").unwrap(), U256::from(255u64));
        assert!(parse_token_id("not-a-number").is_err());
    }
}
