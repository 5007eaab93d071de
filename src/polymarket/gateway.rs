use async_trait::async_trait;
use reqwest::Client;

use super::http::ApiError;
use super::types::{
    ApiActivity, ApiClosedPosition, ApiLeaderboardEntry, ApiPosition, ApiProfile, ApiTrade,
    MarketStatus,
};
use super::{ClobClient, DataClient, GammaClient};

/// Typed read access to every upstream feed the classifier, claim engine and
/// sync jobs consume.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    async fn fetch_trades(&self, limit: u32, offset: u32) -> Result<Vec<ApiTrade>, ApiError>;

    async fn fetch_wallet_trades(&self, wallet: &str, limit: u32) -> Result<Vec<ApiTrade>, ApiError>;

    /// `None` when the market is unknown upstream.
    async fn fetch_market_status(&self, condition_id: &str) -> Result<Option<MarketStatus>, ApiError>;

    async fn fetch_positions(
        &self,
        wallet: &str,
        only_redeemable: bool,
    ) -> Result<Vec<ApiPosition>, ApiError>;

    async fn fetch_profile(&self, wallet: &str) -> Result<Option<ApiProfile>, ApiError>;

    async fn fetch_leaderboard_rank(&self, wallet: &str) -> Result<Option<ApiLeaderboardEntry>, ApiError>;

    async fn fetch_leaderboard(&self, limit: u32) -> Result<Vec<ApiLeaderboardEntry>, ApiError>;

    async fn fetch_activity(&self, wallet: &str, limit: u32) -> Result<Vec<ApiActivity>, ApiError>;

    async fn fetch_closed_positions(
        &self,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<ApiClosedPosition>, ApiError>;
}

/// Live gateway over the Data, Gamma and CLOB APIs.
#[derive(Debug, Clone)]
pub struct PolymarketGateway {
    data: DataClient,
    gamma: GammaClient,
    clob: ClobClient,
}

impl PolymarketGateway {
    pub fn new(http: Client) -> Self {
        Self {
            data: DataClient::new(http.clone()),
            gamma: GammaClient::new(http.clone()),
            clob: ClobClient::new(http),
        }
    }
}

#[async_trait]
impl MarketDataGateway for PolymarketGateway {
    async fn fetch_trades(&self, limit: u32, offset: u32) -> Result<Vec<ApiTrade>, ApiError> {
        self.data.get_trades(limit, offset).await
    }

    async fn fetch_wallet_trades(&self, wallet: &str, limit: u32) -> Result<Vec<ApiTrade>, ApiError> {
        self.data.get_user_trades(wallet, limit).await
    }

    async fn fetch_market_status(&self, condition_id: &str) -> Result<Option<MarketStatus>, ApiError> {
        self.clob.get_market_status(condition_id).await
    }

    async fn fetch_positions(
        &self,
        wallet: &str,
        only_redeemable: bool,
    ) -> Result<Vec<ApiPosition>, ApiError> {
        self.data.get_positions(wallet, only_redeemable).await
    }

    async fn fetch_profile(&self, wallet: &str) -> Result<Option<ApiProfile>, ApiError> {
        self.gamma.get_public_profile(wallet).await
    }

    async fn fetch_leaderboard_rank(&self, wallet: &str) -> Result<Option<ApiLeaderboardEntry>, ApiError> {
        self.data.get_leaderboard_entry(wallet).await
    }

    async fn fetch_leaderboard(&self, limit: u32) -> Result<Vec<ApiLeaderboardEntry>, ApiError> {
        self.data.get_leaderboard(limit).await
    }

    async fn fetch_activity(&self, wallet: &str, limit: u32) -> Result<Vec<ApiActivity>, ApiError> {
        self.data.get_activity(wallet, limit).await
    }

    async fn fetch_closed_positions(
        &self,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<ApiClosedPosition>, ApiError> {
        self.data.get_closed_positions(wallet, limit).await
    }
}
