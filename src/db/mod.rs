pub mod bet_repo;
pub mod claim_repo;
#[cfg(any(test, feature = "testkit"))]
pub mod memory;
pub mod store;
pub mod top_trader_repo;
pub mod trade_repo;

#[cfg(any(test, feature = "testkit"))]
pub use memory::MemoryStore;
pub use store::{BetLog, ClaimLog, PgStore, TopTraderStore, TradeStore};
pub use top_trader_repo::LedgerKey;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Apply pending migrations from `migrations/`.
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
