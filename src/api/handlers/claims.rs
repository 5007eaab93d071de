use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::claims::{ClaimRunSummary, RateLimitStatus};
use crate::errors::AppError;
use crate::models::{ClaimLogEntry, ClaimablePosition};
use crate::AppState;

#[derive(Serialize)]
pub struct ClaimStatusView {
    pub configured: bool,
    pub funder: Option<String>,
    pub rate_limit: RateLimitStatus,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<i64>,
}

/// GET /api/claims/claimable
pub async fn claimable(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ClaimablePosition>>>, AppError> {
    Ok(ApiResponse::ok(state.claims.get_claimable_positions().await?))
}

/// GET /api/claims/status
pub async fn status(State(state): State<AppState>) -> Json<ApiResponse<ClaimStatusView>> {
    let engine = &state.claims;
    ApiResponse::ok(ClaimStatusView {
        configured: engine.is_claiming_configured(),
        funder: engine.session().funder().map(|a| a.to_string()),
        rate_limit: engine.get_rate_limit_status().await,
    })
}

/// POST /api/claims/run: one claim cycle, serialized with the scheduled job.
pub async fn run(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClaimRunSummary>>, AppError> {
    tracing::info!("Claim cycle triggered via API");
    Ok(ApiResponse::ok(state.claims.claim_all_winning().await?))
}

/// GET /api/claims/log?limit=
pub async fn log(
    State(state): State<AppState>,
    Query(q): Query<LogQuery>,
) -> Result<Json<ApiResponse<Vec<ClaimLogEntry>>>, AppError> {
    let limit = q.limit.unwrap_or(50).clamp(1, 500);
    Ok(ApiResponse::ok(state.claim_log.recent_claims(limit).await?))
}
