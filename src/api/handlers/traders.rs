use axum::extract::{Path, State};
use axum::Json;

use super::ApiResponse;
use crate::errors::AppError;
use crate::intelligence::TraderClassification;
use crate::AppState;

/// GET /api/traders/:wallet/classification
pub async fn classification(
    State(state): State<AppState>,
    Path(wallet): Path<String>,
) -> Result<Json<ApiResponse<TraderClassification>>, AppError> {
    if !is_wallet_address(&wallet) {
        return Err(AppError::BadRequest(format!("not a wallet address: {wallet}")));
    }

    let classification = state.classifier.classify_wallet(&wallet).await?;
    Ok(ApiResponse::ok(classification))
}

fn is_wallet_address(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
