//! Operator tool for the claim engine.
//!
//! Runs one-off checks and claim cycles against the configured funder wallet
//! using the same engine, claim log and credentials as the service.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use polydash::claims::{ClaimCredentials, ClaimEngine, ClaimSession};
use polydash::config::AppConfig;
use polydash::db::{self, PgStore};
use polydash::polymarket::{MarketDataGateway, PolymarketGateway};
use polydash::services::ClassificationService;

#[derive(Parser)]
#[command(name = "claim", about = "Inspect and redeem resolved Polymarket positions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show configuration and relayer rate-limit state
    Status,
    /// List redeemable positions of the funder wallet
    Claimable,
    /// Simulate every redeem and report which would revert
    Validate,
    /// Run one full claim cycle
    ClaimAll,
    /// Classify a wallet and print its scores
    Classify {
        /// Proxy wallet address
        wallet: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let http = reqwest::Client::new();
    let gateway: Arc<dyn MarketDataGateway> = Arc::new(PolymarketGateway::new(http.clone()));

    let pool = db::init_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;
    let store = Arc::new(PgStore::new(pool));

    let engine = ClaimEngine::new(
        gateway.clone(),
        store.clone(),
        ClaimSession::new(http, ClaimCredentials::from_config(&config)),
    );

    match cli.command {
        Command::Classify { wallet } => {
            let classifier = ClassificationService::new(gateway, store, config.take_bet_rules());
            let c = classifier.classify_wallet(&wallet).await?;
            println!("{}", serde_json::to_string_pretty(&c)?);
        }
        Command::Status => {
            println!("Configured: {}", engine.is_claiming_configured());
            if let Some(funder) = engine.session().funder() {
                println!("Funder:     {funder}");
            }
            let rl = engine.get_rate_limit_status().await;
            println!("Rate limited: {}", rl.is_limited);
            if let Some(secs) = rl.resets_in {
                println!("  resets in {secs}s");
            }
        }
        Command::Claimable => {
            let positions = engine.get_claimable_positions().await?;
            println!("{} claimable position(s)", positions.len());
            for p in &positions {
                println!(
                    "  {}  ${:.2}  {}",
                    p.condition_id,
                    p.current_value,
                    p.slug.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Validate => {
            let positions = engine.get_claimable_positions().await?;
            let checked = engine.pre_validate_positions(&positions).await?;
            println!("Valid:   {}", checked.valid.len());
            println!("Invalid: {}", checked.invalid.len());
            for invalid in &checked.invalid {
                println!("  {}  {}", invalid.condition_id, invalid.error);
            }
        }
        Command::ClaimAll => {
            let summary = engine.claim_all_winning().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
