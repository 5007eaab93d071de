use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::{TopPvTrader, TopTraderTrade, TopTraderTradeDelta};

/// Ledger key: (slug, side, outcome) for one wallet.
pub type LedgerKey = (String, String, String);

/// Replace the leaderboard snapshot atomically.
pub async fn replace_top_traders(pool: &PgPool, traders: &[TopPvTrader]) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM top_pv_traders").execute(&mut *tx).await?;

    for t in traders {
        sqlx::query(
            r#"
            INSERT INTO top_pv_traders (proxy_wallet, rank, user_name, x_username, verified, pnl, volume)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&t.proxy_wallet)
        .bind(t.rank)
        .bind(&t.user_name)
        .bind(&t.x_username)
        .bind(t.verified)
        .bind(t.pnl)
        .bind(t.volume)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn get_top_traders(pool: &PgPool) -> anyhow::Result<Vec<TopPvTrader>> {
    let rows = sqlx::query_as::<_, TopPvTrader>("SELECT * FROM top_pv_traders ORDER BY rank ASC")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Newest accumulated trade timestamp per ledger key for `wallet`.
pub async fn get_last_timestamps(
    pool: &PgPool,
    wallet: &str,
) -> anyhow::Result<HashMap<LedgerKey, i64>> {
    let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
        "SELECT slug, side, outcome, last_timestamp FROM top_trader_trades WHERE proxy_wallet = $1",
    )
    .bind(wallet)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(slug, side, outcome, ts)| ((slug, side, outcome), ts))
        .collect())
}

/// Add a delta to its ledger row, creating the row if needed.
pub async fn accumulate(pool: &PgPool, d: &TopTraderTradeDelta) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO top_trader_trades (
            proxy_wallet, slug, title, condition_id, side, outcome,
            total_size, total_value, avg_price, trade_count, first_timestamp, last_timestamp
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8,
                CASE WHEN $7 > 0 THEN $8 / $7 ELSE 0 END,
                $9, $10, $11)
        ON CONFLICT (proxy_wallet, slug, side, outcome) DO UPDATE SET
            total_size = top_trader_trades.total_size + EXCLUDED.total_size,
            total_value = top_trader_trades.total_value + EXCLUDED.total_value,
            avg_price = CASE
                WHEN top_trader_trades.total_size + EXCLUDED.total_size > 0
                THEN (top_trader_trades.total_value + EXCLUDED.total_value)
                     / (top_trader_trades.total_size + EXCLUDED.total_size)
                ELSE 0 END,
            trade_count = top_trader_trades.trade_count + EXCLUDED.trade_count,
            first_timestamp = LEAST(top_trader_trades.first_timestamp, EXCLUDED.first_timestamp),
            last_timestamp = GREATEST(top_trader_trades.last_timestamp, EXCLUDED.last_timestamp),
            title = COALESCE(EXCLUDED.title, top_trader_trades.title),
            condition_id = COALESCE(EXCLUDED.condition_id, top_trader_trades.condition_id),
            updated_at = NOW()
        "#,
    )
    .bind(&d.proxy_wallet)
    .bind(&d.slug)
    .bind(&d.title)
    .bind(&d.condition_id)
    .bind(&d.side)
    .bind(&d.outcome)
    .bind(d.size)
    .bind(d.value)
    .bind(d.trade_count)
    .bind(d.first_timestamp)
    .bind(d.last_timestamp)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_trader_trades(pool: &PgPool, wallet: &str) -> anyhow::Result<Vec<TopTraderTrade>> {
    let rows = sqlx::query_as::<_, TopTraderTrade>(
        "SELECT * FROM top_trader_trades WHERE proxy_wallet = $1 ORDER BY last_timestamp DESC",
    )
    .bind(wallet)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
