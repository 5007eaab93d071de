use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.trades.list_trades(None, false, 1, 0).await.is_ok();

    if db_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "claiming_configured": state.claims.is_claiming_configured(),
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unhealthy", "db": "disconnected" })),
        )
    }
}
