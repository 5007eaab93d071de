use reqwest::Client;

use super::http::{build_url, get_json_optional, ApiError};
use super::types::{ApiMarket, MarketStatus};

const CLOB_API_BASE: &str = "https://clob.polymarket.com";

/// Public (unauthenticated) CLOB reads. Order placement goes through
/// [`TradingClient`](super::TradingClient).
#[derive(Debug, Clone)]
pub struct ClobClient {
    http: Client,
    base_url: String,
}

impl ClobClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: CLOB_API_BASE.into(),
        }
    }

    /// Fetch a single market by condition ID. Unknown markets yield `None`.
    pub async fn get_market(&self, condition_id: &str) -> Result<Option<ApiMarket>, ApiError> {
        let url = build_url(&self.base_url, &format!("/markets/{condition_id}"), &[])?;
        get_json_optional(&self.http, url).await
    }

    pub async fn get_market_status(&self, condition_id: &str) -> Result<Option<MarketStatus>, ApiError> {
        Ok(self
            .get_market(condition_id)
            .await?
            .map(|m| MarketStatus::from(&m)))
    }
}
