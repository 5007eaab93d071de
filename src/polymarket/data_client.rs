use reqwest::Client;

use super::http::{build_url, get_json, get_json_optional, ApiError};
use super::types::{ApiActivity, ApiClosedPosition, ApiLeaderboardEntry, ApiPosition, ApiTrade};

const DATA_API_BASE: &str = "https://data-api.polymarket.com";

/// Read-only client for the public Data API (trades, positions, activity,
/// leaderboard).
#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DATA_API_BASE)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch one page of the global trade feed (taker side only).
    pub async fn get_trades(&self, limit: u32, offset: u32) -> Result<Vec<ApiTrade>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/trades",
            &[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("takerOnly", "true".into()),
            ],
        )?;
        get_json(&self.http, url).await
    }

    /// Fetch the most recent trades for a wallet.
    pub async fn get_user_trades(&self, wallet: &str, limit: u32) -> Result<Vec<ApiTrade>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/trades",
            &[("user", wallet.to_string()), ("limit", limit.to_string())],
        )?;
        get_json(&self.http, url).await
    }

    /// Fetch current positions for a wallet, optionally only redeemable ones.
    pub async fn get_positions(
        &self,
        wallet: &str,
        redeemable_only: bool,
    ) -> Result<Vec<ApiPosition>, ApiError> {
        let mut params = vec![
            ("user", wallet.to_string()),
            ("limit", "500".to_string()),
            ("sizeThreshold", "0".to_string()),
        ];
        if redeemable_only {
            params.push(("redeemable", "true".into()));
        }
        let url = build_url(&self.base_url, "/positions", &params)?;
        get_json(&self.http, url).await
    }

    pub async fn get_activity(&self, wallet: &str, limit: u32) -> Result<Vec<ApiActivity>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/activity",
            &[("user", wallet.to_string()), ("limit", limit.to_string())],
        )?;
        get_json(&self.http, url).await
    }

    pub async fn get_closed_positions(
        &self,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<ApiClosedPosition>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/closed-positions",
            &[("user", wallet.to_string()), ("limit", limit.to_string())],
        )?;
        get_json(&self.http, url).await
    }

    /// Fetch the all-time PnL leaderboard.
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<ApiLeaderboardEntry>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/v1/leaderboard",
            &[
                ("timePeriod", "ALL".into()),
                ("orderBy", "PNL".into()),
                ("limit", limit.to_string()),
            ],
        )?;
        get_json(&self.http, url).await
    }

    /// Fetch the all-time leaderboard entry for one wallet, if ranked.
    pub async fn get_leaderboard_entry(
        &self,
        wallet: &str,
    ) -> Result<Option<ApiLeaderboardEntry>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/v1/leaderboard",
            &[
                ("timePeriod", "ALL".into()),
                ("orderBy", "PNL".into()),
                ("user", wallet.to_string()),
            ],
        )?;
        let entries: Option<Vec<ApiLeaderboardEntry>> = get_json_optional(&self.http, url).await?;
        Ok(entries.and_then(|e| e.into_iter().next()))
    }
}
