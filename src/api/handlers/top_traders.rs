use axum::extract::{Path, State};
use axum::Json;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{TopPvTrader, TopTraderTrade};
use crate::AppState;

/// GET /api/top-traders: latest leaderboard snapshot, by rank.
pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TopPvTrader>>>, AppError> {
    Ok(ApiResponse::ok(state.top_traders.top_traders().await?))
}

/// GET /api/top-traders/:wallet/trades: accumulated positions of one trader.
pub async fn ledger(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ApiResponse<Vec<TopTraderTrade>>>, AppError> {
    Ok(ApiResponse::ok(state.top_traders.trader_ledger(&wallet).await?))
}
