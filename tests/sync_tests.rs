mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use polydash::db::{MemoryStore, TradeStore};
use polydash::intelligence::TakeBetRules;
use polydash::models::Side;
use polydash::polymarket::PlacedOrder;
use polydash::services::{
    copy_take_bets, sync_classifications, sync_leaderboard, sync_resolutions, sync_trades,
    ClassificationService, OrderPlacer,
};
use polydash::testkit::fixtures;
use polydash::testkit::gateway::ScriptedGateway;

use common::{as_gateway, new_trade, seed_follow_worthy};

const WALLET_A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const WALLET_B: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

fn classifier(gateway: &Arc<ScriptedGateway>, store: &Arc<MemoryStore>) -> ClassificationService {
    ClassificationService::new(as_gateway(gateway), store.clone(), TakeBetRules::default())
        .with_batch_delay(Duration::ZERO)
}

// ---------------------------------------------------------------------------
// Trade sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_trade_sync_filters_and_is_idempotent() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    let c1 = fixtures::condition_id(1);

    let mut no_hash = fixtures::api_trade("0x4", WALLET_A, &c1, "BUY", dec!(5000), dec!(0.5), 4);
    no_hash.transaction_hash = None;
    gateway
        .set_trades(vec![
            fixtures::api_trade("0x1", WALLET_A, &c1, "BUY", dec!(5000), dec!(0.5), 1),
            fixtures::api_trade("0x2", WALLET_B, &c1, "SELL", dec!(4000), dec!(0.5), 2),
            fixtures::api_trade("0x3", WALLET_B, &c1, "BUY", dec!(10), dec!(0.5), 3),
            no_hash,
        ])
        .await;

    let service = classifier(&gateway, &store);
    let first = sync_trades(gateway.as_ref(), store.as_ref(), &service, 5, dec!(1000))
        .await
        .unwrap();

    assert_eq!(first.fetched, 4);
    assert_eq!(first.inserted, 2);
    assert_eq!(first.below_minimum, 1);
    assert_eq!(first.classification.classified, 2);

    let stored = store.trades().await;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|t| t.classification.is_some()));
    assert!(stored.iter().all(|t| t.take_bet == Some(false)));

    let second = sync_trades(gateway.as_ref(), store.as_ref(), &service, 5, dec!(1000))
        .await
        .unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(store.trades().await.len(), 2);
}

#[tokio::test]
async fn test_classification_is_cached_between_syncs() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    let service = classifier(&gateway, &store);

    service.classify_wallet(WALLET_A).await.unwrap();
    service.classify_wallet(WALLET_A).await.unwrap();

    assert_eq!(gateway.activity_calls(), 1);
    assert_eq!(service.cache().len().await, 1);
}

#[tokio::test]
async fn test_take_bet_flagged_once_per_outcome() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    seed_follow_worthy(&gateway, WALLET_A).await;

    let c1 = fixtures::condition_id(1);
    let c2 = fixtures::condition_id(2);
    for (hash, condition, side, price) in [
        ("0x1", &c1, Side::Buy, dec!(0.40)),
        ("0x2", &c1, Side::Buy, dec!(0.45)),
        ("0x3", &c2, Side::Buy, dec!(0.99)),
        ("0x4", &c2, Side::Sell, dec!(0.50)),
    ] {
        store
            .insert_trade_if_new(&new_trade(hash, WALLET_A, condition, side, price))
            .await
            .unwrap();
    }

    let report = classifier(&gateway, &store)
        .classify_and_apply(&[WALLET_A.to_string()])
        .await;

    assert_eq!(report.classified, 1);
    assert_eq!(report.trades_updated, 4);
    assert_eq!(report.take_bets, 1);

    let flagged: Vec<_> = store
        .trades()
        .await
        .into_iter()
        .filter(|t| t.take_bet == Some(true))
        .collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].transaction_hash, "0x1");
    assert_eq!(flagged[0].good_trader, Some(true));
}

#[tokio::test]
async fn test_failed_take_bet_lookup_leaves_trade_undecided() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    seed_follow_worthy(&gateway, WALLET_A).await;
    store
        .insert_trade_if_new(&new_trade("0x1", WALLET_A, &fixtures::condition_id(1), Side::Buy, dec!(0.40)))
        .await
        .unwrap();
    store.fail_take_bet_lookups(1);

    let service = classifier(&gateway, &store);
    let wallets = [WALLET_A.to_string()];

    let first = service.classify_and_apply(&wallets).await;
    assert_eq!(first.take_bets, 0);
    assert_eq!(store.get_trade("0x1").await.unwrap().unwrap().take_bet, None);

    let second = service.classify_and_apply(&wallets).await;
    assert_eq!(second.take_bets, 1);
    assert_eq!(store.get_trade("0x1").await.unwrap().unwrap().take_bet, Some(true));
}

#[tokio::test]
async fn test_activity_failure_leaves_wallet_unclassified() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    gateway.fail_activity(WALLET_A).await;
    store
        .insert_trade_if_new(&new_trade("0x1", WALLET_A, &fixtures::condition_id(1), Side::Buy, dec!(0.5)))
        .await
        .unwrap();
    store
        .insert_trade_if_new(&new_trade("0x2", WALLET_B, &fixtures::condition_id(1), Side::Buy, dec!(0.5)))
        .await
        .unwrap();

    let report = sync_classifications(store.as_ref(), &classifier(&gateway, &store))
        .await
        .unwrap();

    assert_eq!(report.classified, 1);
    assert_eq!(report.failed, 1);
    let a = store.get_trade("0x1").await.unwrap().unwrap();
    let b = store.get_trade("0x2").await.unwrap().unwrap();
    assert!(a.classification.is_none());
    assert!(b.classification.is_some());
}

// ---------------------------------------------------------------------------
// Resolution sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_resolution_sync_settles_trades() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    let resolved = fixtures::condition_id(1);
    let missing = fixtures::condition_id(2);
    let open = fixtures::condition_id(3);
    let end = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

    let mut loser = new_trade("0x2", WALLET_A, &resolved, Side::Buy, dec!(0.40));
    loser.outcome = "No".into();
    for trade in [
        new_trade("0x1", WALLET_A, &resolved, Side::Buy, dec!(0.25)),
        loser,
        new_trade("0x3", WALLET_A, &resolved, Side::Sell, dec!(0.60)),
        new_trade("0x4", WALLET_A, &missing, Side::Buy, dec!(0.50)),
        new_trade("0x5", WALLET_A, &open, Side::Buy, dec!(0.50)),
    ] {
        store.insert_trade_if_new(&trade).await.unwrap();
    }
    gateway.set_market(&resolved, fixtures::resolved_market("YES")).await;
    gateway.set_market(&open, fixtures::open_market(Some(end))).await;

    let now = Utc::now();
    let report = sync_resolutions(gateway.as_ref(), store.as_ref(), now).await.unwrap();

    assert_eq!(report.conditions, 3);
    assert_eq!(report.resolved, 3);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.still_open, 1);
    assert_eq!(gateway.market_calls(), 3);

    let get = |hash: &'static str| {
        let store = store.clone();
        async move { store.get_trade(hash).await.unwrap().unwrap() }
    };

    let winner = get("0x1").await;
    assert_eq!(winner.resolved_status.as_deref(), Some("won"));
    assert_eq!(winner.profit_per_dollar, Some(Decimal::from(3)));

    let loser = get("0x2").await;
    assert_eq!(loser.resolved_status.as_deref(), Some("lost"));
    assert_eq!(loser.profit_per_dollar, Some(Decimal::NEGATIVE_ONE));

    let seller = get("0x3").await;
    assert_eq!(seller.resolved_status.as_deref(), Some("won"));
    assert_eq!(seller.profit_per_dollar, None);

    let not_found = get("0x4").await;
    assert!(not_found.resolved_status.is_none());
    assert_eq!(not_found.last_resolution_check, Some(now));

    let still_open = get("0x5").await;
    assert!(still_open.resolved_status.is_none());
    assert_eq!(still_open.market_end_date, Some(end));

    // Recently checked trades wait out the recheck window
    sync_resolutions(gateway.as_ref(), store.as_ref(), now).await.unwrap();
    assert_eq!(gateway.market_calls(), 3);

    sync_resolutions(gateway.as_ref(), store.as_ref(), now + ChronoDuration::minutes(31))
        .await
        .unwrap();
    assert_eq!(gateway.market_calls(), 5);
}

#[tokio::test]
async fn test_resolution_sync_aborts_on_upstream_error() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    let c = fixtures::condition_id(1);
    store
        .insert_trade_if_new(&new_trade("0x1", WALLET_A, &c, Side::Buy, dec!(0.5)))
        .await
        .unwrap();
    gateway.fail_market(&c).await;

    let result = sync_resolutions(gateway.as_ref(), store.as_ref(), Utc::now()).await;

    assert!(result.is_err());
    let trade = store.get_trade("0x1").await.unwrap().unwrap();
    assert!(trade.last_resolution_check.is_none());
}

// ---------------------------------------------------------------------------
// Leaderboard sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_leaderboard_sync_accumulates_only_new_trades() {
    let gateway = Arc::new(ScriptedGateway::new());
    let store = Arc::new(MemoryStore::new());
    let c = fixtures::condition_id(1);

    gateway
        .set_leaderboard(vec![
            fixtures::leaderboard_entry(1, WALLET_A, dec!(500000)),
            fixtures::leaderboard_entry(2, WALLET_B, dec!(250000)),
        ])
        .await;
    gateway
        .set_wallet_trades(
            WALLET_A,
            vec![
                fixtures::api_trade("0x1", WALLET_A, &c, "BUY", dec!(100), dec!(0.40), 10),
                fixtures::api_trade("0x2", WALLET_A, &c, "BUY", dec!(100), dec!(0.60), 20),
            ],
        )
        .await;

    let first = sync_leaderboard(gateway.as_ref(), store.as_ref(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(first.traders, 2);
    assert_eq!(first.new_trades, 2);

    let second = sync_leaderboard(gateway.as_ref(), store.as_ref(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(second.new_trades, 0);

    let ledger = store.ledger().await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].trade_count, 2);
    assert_eq!(ledger[0].total_size, dec!(200));
    assert_eq!(ledger[0].avg_price, dec!(0.5));

    gateway
        .set_wallet_trades(
            WALLET_A,
            vec![
                fixtures::api_trade("0x3", WALLET_A, &c, "BUY", dec!(200), dec!(0.80), 30),
                fixtures::api_trade("0x2", WALLET_A, &c, "BUY", dec!(100), dec!(0.60), 20),
            ],
        )
        .await;
    let third = sync_leaderboard(gateway.as_ref(), store.as_ref(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(third.new_trades, 1);

    let ledger = store.ledger().await;
    assert_eq!(ledger[0].trade_count, 3);
    assert_eq!(ledger[0].last_timestamp, 30);
}

// ---------------------------------------------------------------------------
// Auto-copy
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingPlacer {
    orders: Mutex<Vec<(String, Decimal, Decimal)>>,
}

#[async_trait]
impl OrderPlacer for RecordingPlacer {
    async fn place_limit_buy(
        &self,
        token_id: &str,
        size: Decimal,
        price: Decimal,
    ) -> anyhow::Result<PlacedOrder> {
        self.orders.lock().unwrap().push((token_id.to_string(), size, price));
        Ok(PlacedOrder {
            order_id: "order-1".into(),
            status: "LIVE".into(),
        })
    }
}

async fn store_with_take_bet(hash: &str, price: Decimal) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_trade_if_new(&new_trade(hash, WALLET_A, &fixtures::condition_id(1), Side::Buy, price))
        .await
        .unwrap();
    store.set_take_bet(hash, true).await.unwrap();
    store
}

#[tokio::test]
async fn test_auto_copy_places_each_take_bet_once() {
    let store = store_with_take_bet("0x1", dec!(0.40)).await;
    let placer = RecordingPlacer::default();
    let live: &dyn OrderPlacer = &placer;

    let first = copy_take_bets(store.as_ref(), Some(live), dec!(10), false)
        .await
        .unwrap();
    let second = copy_take_bets(store.as_ref(), Some(live), dec!(10), false)
        .await
        .unwrap();

    assert_eq!(first.placed, 1);
    assert_eq!(second.placed, 0);

    let orders = placer.orders.lock().unwrap().clone();
    assert_eq!(orders, vec![("1001".to_string(), dec!(25), dec!(0.40))]);

    let bets = store.bets().await;
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].status, "placed");
    assert_eq!(bets[0].order_id.as_deref(), Some("order-1"));
}

#[tokio::test]
async fn test_auto_copy_dry_run_logs_without_placing() {
    let store = store_with_take_bet("0x1", dec!(0.30)).await;
    let placer = RecordingPlacer::default();
    let live: &dyn OrderPlacer = &placer;

    let report = copy_take_bets(store.as_ref(), Some(live), dec!(10), true)
        .await
        .unwrap();

    assert_eq!(report.dry_run, 1);
    assert!(placer.orders.lock().unwrap().is_empty());
    let bets = store.bets().await;
    assert_eq!(bets[0].status, "dry_run");
    assert_eq!(bets[0].size, dec!(33.33));
}
