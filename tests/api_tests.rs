mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rust_decimal_macros::dec;
use tower::ServiceExt;

use polydash::api::router::create_router;
use polydash::db::TradeStore;
use polydash::intelligence::TakeBetRules;
use polydash::models::Side;
use polydash::services::ClassificationService;
use polydash::testkit::fixtures;
use polydash::AppState;

use common::{as_gateway, claim_harness, new_trade, test_config, ClaimHarness};

const TOKEN: &str = "secret-token";

async fn build_test_app(api_token: Option<&str>) -> (axum::Router, ClaimHarness) {
    let h = claim_harness(3).await;
    let classifier = ClassificationService::new(
        as_gateway(&h.gateway),
        h.store.clone(),
        TakeBetRules::default(),
    );

    let state = AppState {
        config: test_config(api_token),
        trades: h.store.clone(),
        claim_log: h.store.clone(),
        top_traders: h.store.clone(),
        classifier: Arc::new(classifier),
        claims: h.engine.clone(),
        metrics_handle: polydash::metrics::detached_handle(),
    };

    (create_router(state), h)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _h) = build_test_app(None).await;

    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["claiming_configured"], true);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;

    let resp = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;

    let missing = app
        .clone()
        .oneshot(Request::builder().uri("/api/trades").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/trades")
                .header("authorization", "Bearer nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let ok = app.oneshot(get("/api/trades")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_list_trades_filters_by_wallet() {
    let (app, h) = build_test_app(Some(TOKEN)).await;
    let c = fixtures::condition_id(1);
    h.store
        .insert_trade_if_new(&new_trade("0x1", "0xaaa", &c, Side::Buy, dec!(0.5)))
        .await
        .unwrap();
    h.store
        .insert_trade_if_new(&new_trade("0x2", "0xbbb", &c, Side::Buy, dec!(0.5)))
        .await
        .unwrap();

    let resp = app.oneshot(get("/api/trades?wallet=0xaaa")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    let trades = json["data"].as_array().unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0]["transaction_hash"], "0x1");
}

#[tokio::test]
async fn test_list_trades_rejects_bad_limit() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;

    let resp = app.oneshot(get("/api/trades?limit=0")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["success"], false);
}

#[tokio::test]
async fn test_classification_endpoint() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;
    let wallet = "0xcccccccccccccccccccccccccccccccccccccccc";

    let resp = app
        .clone()
        .oneshot(get(&format!("/api/traders/{wallet}/classification")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["wallet"], wallet);
    assert!(json["data"]["follow_score"].is_number());

    let bad = app
        .oneshot(get("/api/traders/not-a-wallet/classification"))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_classification_upstream_failure_is_bad_gateway() {
    let (app, h) = build_test_app(Some(TOKEN)).await;
    let wallet = "0xdddddddddddddddddddddddddddddddddddddddd";
    h.gateway.fail_activity(wallet).await;

    let resp = app
        .oneshot(get(&format!("/api/traders/{wallet}/classification")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_claim_status_and_claimable() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;

    let resp = app.clone().oneshot(get("/api/claims/status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["configured"], true);
    assert_eq!(json["data"]["rate_limit"]["is_limited"], false);

    let resp = app.oneshot(get("/api/claims/claimable")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_run_claims_then_read_log() {
    let (app, h) = build_test_app(Some(TOKEN)).await;

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/claims/run")
                .header("authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["status"], "completed");
    assert_eq!(json["data"]["claimed"], 3);
    assert_eq!(h.executor.submission_count().await, 1);

    let resp = app.oneshot(get("/api/claims/log?limit=2")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let log = body_json(resp).await;
    assert_eq!(log["data"].as_array().unwrap().len(), 2);
    assert_eq!(log["data"][0]["status"], "claimed");
}

#[tokio::test]
async fn test_top_traders_empty_before_sync() {
    let (app, _h) = build_test_app(Some(TOKEN)).await;

    let resp = app.oneshot(get("/api/top-traders")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["data"].as_array().unwrap().is_empty());
}
