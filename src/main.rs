use std::sync::Arc;

use polydash::api::router::create_router;
use polydash::claims::{ClaimCredentials, ClaimEngine, ClaimSession};
use polydash::config::AppConfig;
use polydash::db::{self, BetLog, ClaimLog, PgStore, TopTraderStore, TradeStore};
use polydash::polymarket::{MarketDataGateway, PolymarketGateway, TradingClient};
use polydash::services::auto_copy::{run_auto_copy, OrderPlacer};
use polydash::services::claim_sync::run_claim_sync;
use polydash::services::classification_sync::run_classification_sync;
use polydash::services::leaderboard_sync::run_leaderboard_sync;
use polydash::services::resolution_sync::run_resolution_sync;
use polydash::services::trade_sync::run_trade_sync;
use polydash::services::ClassificationService;
use polydash::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // reqwest and the relayer client share one rustls provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);
    let metrics_handle = polydash::metrics::init_metrics();

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    db::migrate(&pool).await?;
    tracing::info!("Database connected, migrations applied");

    let store = Arc::new(PgStore::new(pool));
    let trades: Arc<dyn TradeStore> = store.clone();
    let claim_log: Arc<dyn ClaimLog> = store.clone();
    let top_traders: Arc<dyn TopTraderStore> = store.clone();
    let bets: Arc<dyn BetLog> = store;

    let http = reqwest::Client::new();
    let gateway: Arc<dyn MarketDataGateway> = Arc::new(PolymarketGateway::new(http.clone()));

    // --- Claim engine ---
    let credentials = ClaimCredentials::from_config(&config);
    if credentials.is_none() {
        tracing::warn!("Claim credentials incomplete, claim cycles will report not configured");
    }
    let engine = Arc::new(ClaimEngine::new(
        gateway.clone(),
        claim_log.clone(),
        ClaimSession::new(http, credentials),
    ));

    let classifier = Arc::new(ClassificationService::new(
        gateway.clone(),
        trades.clone(),
        config.take_bet_rules(),
    ));

    // --- Periodic jobs ---
    tokio::spawn(run_trade_sync(
        gateway.clone(),
        trades.clone(),
        classifier.clone(),
        config.trade_sync_interval,
        config.trade_fetch_pages,
        config.min_trade_usd,
    ));
    tokio::spawn(run_resolution_sync(
        gateway.clone(),
        trades.clone(),
        config.resolution_sync_interval,
    ));
    tokio::spawn(run_classification_sync(
        trades.clone(),
        classifier.clone(),
        config.classification_sync_interval,
    ));
    tokio::spawn(run_leaderboard_sync(
        gateway.clone(),
        top_traders.clone(),
        config.leaderboard_sync_interval,
    ));
    tokio::spawn(run_claim_sync(engine.clone(), config.claim_sync_interval));

    if config.auto_copy_enabled {
        let placer: Option<Arc<dyn OrderPlacer>> = match (&config.private_key, config.dry_run) {
            (Some(key), false) => match TradingClient::connect(key).await {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::error!(error = %e, "CLOB authentication failed, auto-copy falls back to dry run");
                    None
                }
            },
            _ => None,
        };
        tracing::info!(
            live = placer.is_some(),
            usd = %config.auto_copy_usd,
            "Auto-copy of take bets enabled"
        );
        tokio::spawn(run_auto_copy(
            bets,
            placer,
            config.auto_copy_usd,
            config.dry_run,
            config.trade_sync_interval,
        ));
    } else {
        tracing::info!("Auto-copy disabled (AUTO_COPY_ENABLED=false)");
    }

    let state = AppState {
        config,
        trades,
        claim_log,
        top_traders,
        classifier,
        claims: engine,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(EnvFilter::from_default_env());

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
