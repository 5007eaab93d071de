use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{NewTrade, ResolutionUpdate, Trade, TradeClassification};

/// Insert a trade unless its transaction hash is already stored.
/// Returns true when a row was written.
pub async fn insert_if_new(pool: &PgPool, trade: &NewTrade) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO trades (
            transaction_hash, proxy_wallet, condition_id, asset, title, slug,
            outcome, side, size, price, usd_value, timestamp
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (transaction_hash) DO NOTHING
        "#,
    )
    .bind(&trade.transaction_hash)
    .bind(&trade.proxy_wallet)
    .bind(&trade.condition_id)
    .bind(&trade.asset)
    .bind(&trade.title)
    .bind(&trade.slug)
    .bind(&trade.outcome)
    .bind(trade.side.as_str())
    .bind(trade.size)
    .bind(trade.price)
    .bind(trade.usd_value())
    .bind(trade.timestamp)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_trade(pool: &PgPool, transaction_hash: &str) -> anyhow::Result<Option<Trade>> {
    let trade = sqlx::query_as::<_, Trade>("SELECT * FROM trades WHERE transaction_hash = $1")
        .bind(transaction_hash)
        .fetch_optional(pool)
        .await?;

    Ok(trade)
}

/// Most recent trades, optionally for one wallet or take bets only.
pub async fn list_trades(
    pool: &PgPool,
    wallet: Option<&str>,
    take_bets_only: bool,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE ($1::TEXT IS NULL OR proxy_wallet = $1)
          AND (NOT $2 OR take_bet = true)
        ORDER BY timestamp DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(wallet)
    .bind(take_bets_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Unresolved trades never checked, or last checked before `stale_before`.
pub async fn get_due_for_resolution(
    pool: &PgPool,
    stale_before: DateTime<Utc>,
    limit: i64,
) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT * FROM trades
        WHERE resolved_status IS NULL
          AND (last_resolution_check IS NULL OR last_resolution_check < $1)
        ORDER BY last_resolution_check ASC NULLS FIRST, timestamp ASC
        LIMIT $2
        "#,
    )
    .bind(stale_before)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn set_resolution(
    pool: &PgPool,
    transaction_hash: &str,
    update: &ResolutionUpdate,
    checked_at: DateTime<Utc>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE trades
        SET resolved_status = $2,
            profit_per_dollar = $3,
            market_end_date = COALESCE($4, market_end_date),
            last_resolution_check = $5
        WHERE transaction_hash = $1
        "#,
    )
    .bind(transaction_hash)
    .bind(update.resolved_status.as_str())
    .bind(update.profit_per_dollar)
    .bind(update.market_end_date)
    .bind(checked_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stamp a resolution check, filling the end date if newly known.
pub async fn mark_checked(
    pool: &PgPool,
    transaction_hash: &str,
    checked_at: DateTime<Utc>,
    market_end_date: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE trades
        SET last_resolution_check = $2,
            market_end_date = COALESCE(market_end_date, $3)
        WHERE transaction_hash = $1
        "#,
    )
    .bind(transaction_hash)
    .bind(checked_at)
    .bind(market_end_date)
    .execute(pool)
    .await?;

    Ok(())
}

/// Write classification fields onto every trade of `wallet`.
pub async fn apply_classification(
    pool: &PgPool,
    wallet: &str,
    c: &TradeClassification,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE trades
        SET good_trader = $2,
            insider_score = $3,
            bot_score = $4,
            whale_score = $5,
            follow_score = $6,
            classification = $7
        WHERE proxy_wallet = $1
        "#,
    )
    .bind(wallet)
    .bind(c.good_trader)
    .bind(c.insider_score)
    .bind(c.bot_score)
    .bind(c.whale_score)
    .bind(c.follow_score)
    .bind(&c.classification)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Trades of `wallet` whose take-bet flag is not yet decided, oldest first.
pub async fn get_undecided_take_bets(pool: &PgPool, wallet: &str) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        "SELECT * FROM trades WHERE proxy_wallet = $1 AND take_bet IS NULL ORDER BY timestamp ASC",
    )
    .bind(wallet)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

pub async fn has_take_bet(
    pool: &PgPool,
    wallet: &str,
    condition_id: &str,
    outcome: &str,
) -> anyhow::Result<bool> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM trades
            WHERE proxy_wallet = $1 AND condition_id = $2 AND outcome = $3 AND take_bet = true
        )
        "#,
    )
    .bind(wallet)
    .bind(condition_id)
    .bind(outcome)
    .fetch_one(pool)
    .await?;

    Ok(row.0)
}

pub async fn set_take_bet(pool: &PgPool, transaction_hash: &str, take_bet: bool) -> anyhow::Result<()> {
    sqlx::query("UPDATE trades SET take_bet = $2 WHERE transaction_hash = $1")
        .bind(transaction_hash)
        .bind(take_bet)
        .execute(pool)
        .await?;

    Ok(())
}

/// Distinct wallets behind the oldest `limit` unclassified trades.
pub async fn get_unclassified_wallets(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT proxy_wallet FROM (
            SELECT proxy_wallet, timestamp FROM trades
            WHERE classification IS NULL
            ORDER BY timestamp ASC
            LIMIT $1
        ) oldest
        GROUP BY proxy_wallet
        ORDER BY MIN(timestamp) ASC
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}
