use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes, Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Trades
        .route("/api/trades", get(handlers::trades::list))
        // Trader intelligence
        .route(
            "/api/traders/:wallet/classification",
            get(handlers::traders::classification),
        )
        .route("/api/top-traders", get(handlers::top_traders::list))
        .route("/api/top-traders/:wallet/trades", get(handlers::top_traders::ledger))
        // Claims
        .route("/api/claims/claimable", get(handlers::claims::claimable))
        .route("/api/claims/status", get(handlers::claims::status))
        .route("/api/claims/run", post(handlers::claims::run))
        .route("/api/claims/log", get(handlers::claims::log))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
