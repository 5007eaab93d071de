use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::polymarket::{
    ApiActivity, ApiClosedPosition, ApiError, ApiLeaderboardEntry, ApiPosition, ApiProfile,
    ApiTrade, MarketDataGateway, MarketStatus,
};

#[derive(Default)]
struct Script {
    trades: Vec<ApiTrade>,
    wallet_trades: HashMap<String, Vec<ApiTrade>>,
    markets: HashMap<String, MarketStatus>,
    failing_markets: HashSet<String>,
    positions: HashMap<String, Vec<ApiPosition>>,
    profiles: HashMap<String, ApiProfile>,
    leaderboard: Vec<ApiLeaderboardEntry>,
    activity: HashMap<String, Vec<ApiActivity>>,
    failing_activity: HashSet<String>,
    closed_positions: HashMap<String, Vec<ApiClosedPosition>>,
    failing_positions: bool,
    unfiltered_positions: bool,
}

/// In-memory [`MarketDataGateway`]. Wallet keys are case-insensitive.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
    market_calls: AtomicUsize,
    activity_calls: AtomicUsize,
}

fn key(wallet: &str) -> String {
    wallet.to_lowercase()
}

fn server_error(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 500,
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_trades(&self, trades: Vec<ApiTrade>) {
        self.script.lock().await.trades = trades;
    }

    pub async fn set_wallet_trades(&self, wallet: &str, trades: Vec<ApiTrade>) {
        self.script.lock().await.wallet_trades.insert(key(wallet), trades);
    }

    pub async fn set_market(&self, condition_id: &str, status: MarketStatus) {
        self.script
            .lock()
            .await
            .markets
            .insert(condition_id.to_string(), status);
    }

    pub async fn fail_market(&self, condition_id: &str) {
        self.script
            .lock()
            .await
            .failing_markets
            .insert(condition_id.to_string());
    }

    pub async fn set_positions(&self, wallet: &str, positions: Vec<ApiPosition>) {
        self.script.lock().await.positions.insert(key(wallet), positions);
    }

    pub async fn fail_positions(&self) {
        self.script.lock().await.failing_positions = true;
    }

    /// Return every scripted position even when only redeemable ones are
    /// requested, as the live feed sometimes does.
    pub async fn ignore_redeemable_filter(&self) {
        self.script.lock().await.unfiltered_positions = true;
    }

    pub async fn set_profile(&self, wallet: &str, profile: ApiProfile) {
        self.script.lock().await.profiles.insert(key(wallet), profile);
    }

    pub async fn set_leaderboard(&self, entries: Vec<ApiLeaderboardEntry>) {
        self.script.lock().await.leaderboard = entries;
    }

    pub async fn set_activity(&self, wallet: &str, activity: Vec<ApiActivity>) {
        self.script.lock().await.activity.insert(key(wallet), activity);
    }

    pub async fn fail_activity(&self, wallet: &str) {
        self.script.lock().await.failing_activity.insert(key(wallet));
    }

    pub async fn set_closed_positions(&self, wallet: &str, positions: Vec<ApiClosedPosition>) {
        self.script
            .lock()
            .await
            .closed_positions
            .insert(key(wallet), positions);
    }

    pub fn market_calls(&self) -> usize {
        self.market_calls.load(Ordering::SeqCst)
    }

    pub fn activity_calls(&self) -> usize {
        self.activity_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataGateway for ScriptedGateway {
    async fn fetch_trades(&self, limit: u32, offset: u32) -> Result<Vec<ApiTrade>, ApiError> {
        let script = self.script.lock().await;
        Ok(script
            .trades
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_wallet_trades(&self, wallet: &str, limit: u32) -> Result<Vec<ApiTrade>, ApiError> {
        let script = self.script.lock().await;
        Ok(script
            .wallet_trades
            .get(&key(wallet))
            .map(|t| t.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_market_status(&self, condition_id: &str) -> Result<Option<MarketStatus>, ApiError> {
        self.market_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().await;
        if script.failing_markets.contains(condition_id) {
            return Err(server_error("/markets"));
        }
        Ok(script.markets.get(condition_id).cloned())
    }

    async fn fetch_positions(
        &self,
        wallet: &str,
        only_redeemable: bool,
    ) -> Result<Vec<ApiPosition>, ApiError> {
        let script = self.script.lock().await;
        if script.failing_positions {
            return Err(server_error("/positions"));
        }
        let only_redeemable = only_redeemable && !script.unfiltered_positions;
        Ok(script
            .positions
            .get(&key(wallet))
            .map(|p| {
                p.iter()
                    .filter(|p| !only_redeemable || p.redeemable)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_profile(&self, wallet: &str) -> Result<Option<ApiProfile>, ApiError> {
        Ok(self.script.lock().await.profiles.get(&key(wallet)).cloned())
    }

    async fn fetch_leaderboard_rank(&self, wallet: &str) -> Result<Option<ApiLeaderboardEntry>, ApiError> {
        let script = self.script.lock().await;
        Ok(script
            .leaderboard
            .iter()
            .find(|e| e.proxy_wallet.eq_ignore_ascii_case(wallet))
            .cloned())
    }

    async fn fetch_leaderboard(&self, limit: u32) -> Result<Vec<ApiLeaderboardEntry>, ApiError> {
        let script = self.script.lock().await;
        Ok(script.leaderboard.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_activity(&self, wallet: &str, limit: u32) -> Result<Vec<ApiActivity>, ApiError> {
        self.activity_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().await;
        if script.failing_activity.contains(&key(wallet)) {
            return Err(server_error("/activity"));
        }
        Ok(script
            .activity
            .get(&key(wallet))
            .map(|a| a.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_closed_positions(
        &self,
        wallet: &str,
        limit: u32,
    ) -> Result<Vec<ApiClosedPosition>, ApiError> {
        let script = self.script.lock().await;
        Ok(script
            .closed_positions
            .get(&key(wallet))
            .map(|p| p.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }
}
