use sqlx::PgPool;

use crate::models::{BetLogEntry, NewBet, Trade};

/// Take-bet trades that have no bet-log row yet, oldest first.
pub async fn get_uncopied_take_bets(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<Trade>> {
    let trades = sqlx::query_as::<_, Trade>(
        r#"
        SELECT t.* FROM trades t
        LEFT JOIN bet_log b ON b.transaction_hash = t.transaction_hash
        WHERE t.take_bet = true AND b.id IS NULL
        ORDER BY t.timestamp ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(trades)
}

/// Record a copy attempt; a second attempt for the same trade is ignored.
pub async fn insert_bet(pool: &PgPool, bet: &NewBet) -> anyhow::Result<Option<BetLogEntry>> {
    let row = sqlx::query_as::<_, BetLogEntry>(
        r#"
        INSERT INTO bet_log (transaction_hash, condition_id, outcome, price, size, status, order_id, error)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (transaction_hash) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(&bet.transaction_hash)
    .bind(&bet.condition_id)
    .bind(&bet.outcome)
    .bind(bet.price)
    .bind(bet.size)
    .bind(bet.status.as_str())
    .bind(&bet.order_id)
    .bind(&bet.error)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
