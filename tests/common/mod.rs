use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::{Mutex, MutexGuard};

use polydash::claims::{ClaimEngine, ClaimSession, PollSettings};
use polydash::config::AppConfig;
use polydash::db::MemoryStore;
use polydash::models::{NewTrade, Side};
use polydash::polymarket::MarketDataGateway;
use polydash::testkit::executor::ScriptedExecutor;
use polydash::testkit::fixtures;
use polydash::testkit::gateway::ScriptedGateway;

/// Serializes tests that share the database tables.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

#[allow(dead_code)]
pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Connect to the test database, run all migrations and empty the tables.
/// `None` when `TEST_DATABASE_URL` is unset, so DB-backed tests are skipped.
#[allow(dead_code)]
pub async fn setup_test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };
    let guard = DB_LOCK.lock().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");

    polydash::db::migrate(&pool)
        .await
        .expect("Failed to run migrations");

    // Clean tables for test isolation
    sqlx::query("DELETE FROM bet_log").execute(&pool).await.ok();
    sqlx::query("DELETE FROM claim_log").execute(&pool).await.ok();
    sqlx::query("DELETE FROM top_trader_trades").execute(&pool).await.ok();
    sqlx::query("DELETE FROM top_pv_traders").execute(&pool).await.ok();
    sqlx::query("DELETE FROM trades").execute(&pool).await.ok();

    Some(TestDb {
        pool,
        _guard: guard,
    })
}

#[allow(dead_code)]
pub fn funder() -> Address {
    Address::repeat_byte(0x11)
}

/// Claim engine over scripted collaborators with instant confirmation polling.
#[allow(dead_code)]
pub struct ClaimHarness {
    pub gateway: Arc<ScriptedGateway>,
    pub executor: Arc<ScriptedExecutor>,
    pub store: Arc<MemoryStore>,
    pub engine: Arc<ClaimEngine>,
}

#[allow(dead_code)]
pub async fn claim_harness(position_count: u32) -> ClaimHarness {
    let gateway = Arc::new(ScriptedGateway::new());
    let executor = Arc::new(ScriptedExecutor::new());
    let store = Arc::new(MemoryStore::new());

    let positions = (1..=position_count)
        .map(|n| fixtures::api_position(&fixtures::condition_id(n), Decimal::from(10), true))
        .collect();
    gateway.set_positions(&funder().to_string(), positions).await;

    let session = ClaimSession::with_executor(funder(), executor.clone());
    let engine = ClaimEngine::new(gateway.clone(), store.clone(), session).with_poll_settings(
        PollSettings {
            max_polls: 1,
            interval: Duration::ZERO,
        },
    );

    ClaimHarness {
        gateway,
        executor,
        store,
        engine: Arc::new(engine),
    }
}

/// A stored trade of `size` shares at `price`, outcome "Yes".
#[allow(dead_code)]
pub fn new_trade(hash: &str, wallet: &str, condition: &str, side: Side, price: Decimal) -> NewTrade {
    NewTrade {
        transaction_hash: hash.to_string(),
        proxy_wallet: wallet.to_string(),
        condition_id: condition.to_string(),
        asset: "1001".to_string(),
        title: Some(format!("Market {condition}")),
        slug: Some(format!("market-{condition}")),
        outcome: "Yes".to_string(),
        side,
        size: Decimal::from(5_000),
        price,
        timestamp: 1_700_000_000,
    }
}

/// Script `wallet` as a seasoned, profitable trader: 75% win rate over 60
/// closed positions, $210k realized and a 400-day-old account.
#[allow(dead_code)]
pub async fn seed_follow_worthy(gateway: &ScriptedGateway, wallet: &str) {
    let mut closed: Vec<_> = (0..45)
        .map(|_| fixtures::closed_position(Decimal::from(5_000)))
        .collect();
    closed.extend((0..15).map(|_| fixtures::closed_position(Decimal::from(-1_000))));

    gateway.set_closed_positions(wallet, closed).await;
    gateway
        .set_profile(wallet, fixtures::profile(Utc::now() - chrono::Duration::days(400), "whale"))
        .await;
}

#[allow(dead_code)]
pub fn as_gateway(gateway: &Arc<ScriptedGateway>) -> Arc<dyn MarketDataGateway> {
    gateway.clone()
}

#[allow(dead_code)]
pub fn test_config(api_token: Option<&str>) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        api_token: api_token.map(str::to_string),
        polygon_rpc_url: "http://localhost:8545".into(),
        private_key: None,
        funder_address: None,
        builder_api_key: None,
        builder_secret: None,
        builder_passphrase: None,
        relayer_url: "http://localhost:9999".into(),
        trade_sync_interval: Duration::from_secs(600),
        resolution_sync_interval: Duration::from_secs(900),
        claim_sync_interval: Duration::from_secs(1800),
        classification_sync_interval: Duration::from_secs(1200),
        leaderboard_sync_interval: Duration::from_secs(3600),
        min_trade_usd: Decimal::from(1_000),
        trade_fetch_pages: 5,
        take_bet_min_follow_score: 60,
        take_bet_min_price: Decimal::new(5, 2),
        take_bet_max_price: Decimal::new(95, 2),
        auto_copy_enabled: false,
        auto_copy_usd: Decimal::from(10),
        dry_run: true,
    }
}
