use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::Trade;
use crate::AppState;

const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct TradeQuery {
    pub wallet: Option<String>,
    #[serde(default)]
    pub take_bets: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/trades?wallet=&take_bets=&limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<TradeQuery>,
) -> Result<Json<ApiResponse<Vec<Trade>>>, AppError> {
    let limit = q.limit.unwrap_or(100);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!("limit must be between 1 and {MAX_LIMIT}")));
    }

    let trades = state
        .trades
        .list_trades(q.wallet.as_deref(), q.take_bets, limit, q.offset.unwrap_or(0).max(0))
        .await?;

    Ok(ApiResponse::ok(trades))
}
