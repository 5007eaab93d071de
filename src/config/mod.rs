use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::intelligence::TakeBetRules;

const DEFAULT_RPC_URL: &str = "https://polygon-rpc.com";
const DEFAULT_RELAYER_URL: &str = "https://relayer-v2.polymarket.com";

/// Process configuration. Not `Debug`: it carries the wallet key and
/// builder secret.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,

    // Chain + wallet (optional; claiming and order placement need them)
    pub polygon_rpc_url: String,
    pub private_key: Option<String>,
    pub funder_address: Option<String>,

    // Relayer builder credentials (optional)
    pub builder_api_key: Option<String>,
    pub builder_secret: Option<String>,
    pub builder_passphrase: Option<String>,
    pub relayer_url: String,

    // Job periods
    pub trade_sync_interval: Duration,
    pub resolution_sync_interval: Duration,
    pub claim_sync_interval: Duration,
    pub classification_sync_interval: Duration,
    pub leaderboard_sync_interval: Duration,

    // Ingestion
    pub min_trade_usd: Decimal,
    pub trade_fetch_pages: u32,

    // Take bets + auto-copy
    pub take_bet_min_follow_score: i32,
    pub take_bet_min_price: Decimal,
    pub take_bet_max_price: Decimal,
    pub auto_copy_enabled: bool,
    pub auto_copy_usd: Decimal,
    pub dry_run: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: non_empty("API_TOKEN"),

            polygon_rpc_url: env::var("POLYGON_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.into()),
            private_key: non_empty("PRIVATE_KEY"),
            funder_address: non_empty("FUNDER_ADDRESS"),

            builder_api_key: non_empty("BUILDER_API_KEY"),
            builder_secret: non_empty("BUILDER_SECRET"),
            builder_passphrase: non_empty("BUILDER_PASSPHRASE"),
            relayer_url: env::var("RELAYER_URL").unwrap_or_else(|_| DEFAULT_RELAYER_URL.into()),

            trade_sync_interval: secs("TRADE_SYNC_INTERVAL_SECS", 600),
            resolution_sync_interval: secs("RESOLUTION_SYNC_INTERVAL_SECS", 900),
            claim_sync_interval: secs("CLAIM_SYNC_INTERVAL_SECS", 1800),
            classification_sync_interval: secs("CLASSIFICATION_SYNC_INTERVAL_SECS", 1200),
            leaderboard_sync_interval: secs("LEADERBOARD_SYNC_INTERVAL_SECS", 3600),

            min_trade_usd: parsed("MIN_TRADE_USD", Decimal::from(1_000)),
            trade_fetch_pages: parsed("TRADE_FETCH_PAGES", 5),

            take_bet_min_follow_score: parsed("TAKE_BET_MIN_FOLLOW_SCORE", 60),
            take_bet_min_price: parsed("TAKE_BET_MIN_PRICE", Decimal::new(5, 2)),
            take_bet_max_price: parsed("TAKE_BET_MAX_PRICE", Decimal::new(95, 2)),
            auto_copy_enabled: parsed("AUTO_COPY_ENABLED", false),
            auto_copy_usd: parsed("AUTO_COPY_USD", Decimal::from(10)),
            dry_run: parsed("DRY_RUN", true),
        })
    }

    /// Returns true if the wallet key, funder address and all builder
    /// credentials are configured.
    pub fn has_claim_credentials(&self) -> bool {
        self.private_key.is_some()
            && self.funder_address.is_some()
            && self.builder_api_key.is_some()
            && self.builder_secret.is_some()
            && self.builder_passphrase.is_some()
    }

    pub fn take_bet_rules(&self) -> TakeBetRules {
        TakeBetRules {
            min_follow_score: self.take_bet_min_follow_score,
            min_price: self.take_bet_min_price,
            max_price: self.take_bet_max_price,
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key`, falling back to `default` when unset or malformed.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparseable config value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(parsed(key, default).max(1))
}
